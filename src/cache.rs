//! The in-memory net-worth snapshot shared between the refresh task and
//! request handlers.

use std::sync::{Arc, RwLock};

use crate::models::NetWorthSnapshot;

/// Holds at most one snapshot. Readers get a cheap `Arc` clone, so a reader
/// sees either the previous snapshot or the new one, never a mix.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Option<Arc<NetWorthSnapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<NetWorthSnapshot>> {
        // The guarded value is swapped in one assignment, so a poisoned lock
        // still holds a complete snapshot.
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Swap in a new snapshot and return it.
    pub fn replace(&self, snapshot: NetWorthSnapshot) -> Arc<NetWorthSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        snapshot
    }

    pub fn is_populated(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn snapshot(total: rust_decimal::Decimal) -> NetWorthSnapshot {
        NetWorthSnapshot {
            net_worth: total,
            currency: "USD".to_string(),
            computed_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            accounts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn starts_empty() {
        let cache = SnapshotCache::new();
        assert!(cache.current().is_none());
        assert!(!cache.is_populated());
    }

    #[test]
    fn replacement_leaves_earlier_readers_untouched() {
        let cache = SnapshotCache::new();
        cache.replace(snapshot(dec!(100)));
        let held = cache.current().unwrap();

        cache.replace(snapshot(dec!(200)));

        assert_eq!(held.net_worth, dec!(100));
        assert_eq!(cache.current().unwrap().net_worth, dec!(200));
    }
}
