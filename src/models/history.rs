use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::NetWorthSnapshot;

/// One persisted net-worth observation.
///
/// Field names are camelCase on disk so existing history files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The same instant as an ISO-8601 string.
    pub date: String,
    pub net_worth: Decimal,
    pub currency: String,
    pub account_count: usize,
}

impl HistoryEntry {
    pub fn new(
        at: DateTime<Utc>,
        net_worth: Decimal,
        currency: impl Into<String>,
        account_count: usize,
    ) -> Self {
        Self {
            timestamp: at.timestamp_millis(),
            date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            net_worth,
            currency: currency.into(),
            account_count,
        }
    }

    pub fn from_snapshot(snapshot: &NetWorthSnapshot) -> Self {
        Self::new(
            snapshot.computed_at,
            snapshot.net_worth,
            snapshot.currency.clone(),
            snapshot.account_count(),
        )
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}
