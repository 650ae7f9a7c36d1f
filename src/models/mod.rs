mod account;
mod history;
mod snapshot;

pub use account::{Account, AccountSet};
pub use history::HistoryEntry;
pub use snapshot::{AccountBalance, NetWorthSnapshot};
