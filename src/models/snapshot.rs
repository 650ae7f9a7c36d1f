use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One account's contribution to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub name: String,
    pub balance: Decimal,
}

impl AccountBalance {
    pub fn new(name: impl Into<String>, balance: Decimal) -> Self {
        Self {
            name: name.into(),
            balance,
        }
    }
}

/// The cached result of a refresh. Built once, then only ever replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetWorthSnapshot {
    pub net_worth: Decimal,
    pub currency: String,
    pub computed_at: DateTime<Utc>,
    /// Included accounts in upstream order.
    pub accounts: Vec<AccountBalance>,
    pub warnings: Vec<String>,
}

impl NetWorthSnapshot {
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}
