use serde::{Deserialize, Serialize};

/// A single account as reported by the aggregation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// ISO 4217 code, or a URL naming a custom unit (reward points, miles).
    pub currency: String,
    /// Balance as reported upstream; kept as a string to avoid float rounding.
    pub balance: String,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        currency: impl Into<String>,
        balance: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            currency: currency.into(),
            balance: balance.into(),
        }
    }
}

/// Result of one balances-only fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSet {
    pub accounts: Vec<Account>,
    /// Upstream-reported problems, already sanitized.
    pub warnings: Vec<String>,
}

impl AccountSet {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}
