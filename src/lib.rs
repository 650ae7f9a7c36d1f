pub mod cache;
pub mod clock;
pub mod config;
pub mod duration;
pub mod format;
pub mod models;
pub mod networth;
pub mod query;
pub mod refresh;
#[cfg(feature = "server")]
pub mod server;
pub mod shutdown;
pub mod storage;
pub mod sync;
