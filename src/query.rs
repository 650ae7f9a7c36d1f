//! Read-side answers built from the cached snapshot and the history log.
//!
//! Nothing here triggers a fetch.

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;

use crate::cache::SnapshotCache;
use crate::clock::{Clock, SystemClock};
use crate::format::{format_amount, format_change};
use crate::models::{HistoryEntry, NetWorthSnapshot};
use crate::storage::{HistoryStore, PersistenceError};

/// How far back the change figure looks.
pub const CHANGE_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("net worth not yet available")]
    Unavailable,

    #[error("insufficient history for a 30-day comparison")]
    InsufficientData,

    #[error("net worth change is outside the representable range")]
    Overflow,

    #[error(transparent)]
    History(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthDetails {
    #[serde(with = "rust_decimal::serde::float")]
    pub net_worth: Decimal,
    pub currency: String,
    pub formatted: String,
    pub last_updated: String,
    pub account_count: usize,
    #[serde(rename = "change30Days", with = "rust_decimal::serde::float_option")]
    pub change_30_days: Option<Decimal>,
    #[serde(rename = "change30DaysFormatted")]
    pub change_30_days_formatted: Option<String>,
}

pub struct QueryService {
    cache: Arc<SnapshotCache>,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(cache: Arc<SnapshotCache>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            cache,
            history,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn snapshot(&self) -> Result<Arc<NetWorthSnapshot>, QueryError> {
        self.cache.current().ok_or(QueryError::Unavailable)
    }

    pub fn current_net_worth(&self) -> Result<Decimal, QueryError> {
        Ok(self.snapshot()?.net_worth)
    }

    /// Current net worth minus the most recent history entry that is at
    /// least [`CHANGE_LOOKBACK_DAYS`] old.
    pub async fn change_30_days(&self) -> Result<Decimal, QueryError> {
        let current = self.snapshot()?;
        let history = self.history.read_all().await?;
        change_30_days_at(&history, current.net_worth, self.clock.now())?
            .ok_or(QueryError::InsufficientData)
    }

    pub async fn details(&self) -> Result<NetWorthDetails, QueryError> {
        let snapshot = self.snapshot()?;

        let change = match self.history.read_all().await {
            Ok(history) => change_30_days_at(&history, snapshot.net_worth, self.clock.now()),
            Err(err) => Err(QueryError::from(err)),
        };
        let change = change.unwrap_or_else(|err| {
            error!(error = %err, "failed to compute 30-day change");
            None
        });

        Ok(NetWorthDetails {
            net_worth: snapshot.net_worth,
            currency: snapshot.currency.clone(),
            formatted: format_amount(snapshot.net_worth, &snapshot.currency),
            last_updated: snapshot
                .computed_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            account_count: snapshot.account_count(),
            change_30_days: change,
            change_30_days_formatted: change.map(|c| format_change(c, &snapshot.currency)),
        })
    }
}

/// The entry `change_30_days_at` compares against: greatest timestamp at or
/// before the cutoff, later entries in the log winning ties.
pub fn baseline_entry(history: &[HistoryEntry], now: DateTime<Utc>) -> Option<&HistoryEntry> {
    let cutoff = (now - Duration::days(CHANGE_LOOKBACK_DAYS)).timestamp_millis();

    let mut baseline: Option<&HistoryEntry> = None;
    for entry in history.iter().filter(|e| e.timestamp <= cutoff) {
        if baseline.map_or(true, |b| entry.timestamp >= b.timestamp) {
            baseline = Some(entry);
        }
    }
    baseline
}

/// `Ok(None)` when no entry is old enough.
pub fn change_30_days_at(
    history: &[HistoryEntry],
    current: Decimal,
    now: DateTime<Utc>,
) -> Result<Option<Decimal>, QueryError> {
    baseline_entry(history, now)
        .map(|old| current.checked_sub(old.net_worth).ok_or(QueryError::Overflow))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(n)
    }

    fn entry(at: DateTime<Utc>, net_worth: Decimal) -> HistoryEntry {
        HistoryEntry::new(at, net_worth, "USD", 2)
    }

    #[test]
    fn empty_history_has_no_baseline() {
        assert_eq!(change_30_days_at(&[], dec!(100), day(40)).unwrap(), None);
    }

    #[test]
    fn recent_entries_do_not_qualify() {
        let history = vec![entry(day(20), dec!(900)), entry(day(39), dec!(950))];
        assert_eq!(change_30_days_at(&history, dec!(1000), day(40)).unwrap(), None);
    }

    #[test]
    fn picks_most_recent_entry_at_least_thirty_days_old() {
        let history = vec![
            entry(day(0), dec!(1000)),
            entry(day(5), dec!(1100)),
            entry(day(30), dec!(1150)),
        ];
        assert_eq!(
            change_30_days_at(&history, dec!(1200), day(35)).unwrap(),
            Some(dec!(100))
        );
    }

    #[test]
    fn entry_exactly_at_cutoff_counts() {
        let history = vec![entry(day(0), dec!(500))];
        assert_eq!(
            change_30_days_at(&history, dec!(450), day(30)).unwrap(),
            Some(dec!(-50))
        );
    }

    #[test]
    fn later_entry_wins_timestamp_tie() {
        let history = vec![entry(day(0), dec!(100)), entry(day(0), dec!(300))];
        let baseline = baseline_entry(&history, day(31)).unwrap();
        assert_eq!(baseline.net_worth, dec!(300));
    }

    #[test]
    fn change_outside_decimal_range_is_an_error() {
        let history = vec![entry(day(0), dec!(-1))];
        let result = change_30_days_at(&history, Decimal::MAX, day(31));
        assert!(matches!(result, Err(QueryError::Overflow)));
    }

    #[tokio::test]
    async fn details_report_no_change_when_it_overflows() {
        use crate::clock::FixedClock;
        use crate::storage::MemoryHistoryStore;

        let cache = Arc::new(SnapshotCache::new());
        cache.replace(NetWorthSnapshot {
            net_worth: Decimal::MAX,
            currency: "USD".to_string(),
            computed_at: day(31),
            accounts: Vec::new(),
            warnings: Vec::new(),
        });
        let history = MemoryHistoryStore::with_entries(vec![entry(day(0), dec!(-1))]);
        let service = QueryService::new(cache, Arc::new(history))
            .with_clock(Arc::new(FixedClock::new(day(31))));

        assert!(matches!(
            service.change_30_days().await,
            Err(QueryError::Overflow)
        ));
        let details = service.details().await.unwrap();
        assert_eq!(details.change_30_days, None);
        assert_eq!(details.net_worth, Decimal::MAX);
    }

    #[test]
    fn details_serialize_numbers_as_json_numbers() {
        let details = NetWorthDetails {
            net_worth: dec!(1234.56),
            currency: "USD".to_string(),
            formatted: "$1,234.56".to_string(),
            last_updated: "2026-02-05T12:00:00.000Z".to_string(),
            account_count: 3,
            change_30_days: None,
            change_30_days_formatted: None,
        };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["netWorth"], 1234.56);
        assert_eq!(json["accountCount"], 3);
        assert!(json["change30Days"].is_null());
        assert!(json["change30DaysFormatted"].is_null());
    }
}
