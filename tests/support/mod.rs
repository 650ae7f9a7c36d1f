#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use networth::models::{Account, AccountSet, HistoryEntry};
use networth::storage::{HistoryStore, PersistenceError};
use networth::sync::{AccountSource, FetchError};

pub fn accounts(rows: &[(&str, &str, &str)]) -> AccountSet {
    AccountSet::new(
        rows.iter()
            .enumerate()
            .map(|(i, (name, balance, currency))| {
                Account::new(format!("ACT-{i}"), *name, *currency, *balance)
            })
            .collect(),
    )
}

pub fn checking(balance: &str) -> AccountSet {
    accounts(&[("Checking", balance, "USD")])
}

/// Noon UTC on the given day of 2026.
pub fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, 12, 0, 0).unwrap()
}

/// Account source that replays scripted results, then repeats `fallback`.
pub struct MockAccountSource {
    script: Mutex<VecDeque<Result<AccountSet, FetchError>>>,
    fallback: AccountSet,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockAccountSource {
    pub fn new(fallback: AccountSet) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn then(self, result: Result<AccountSet, FetchError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn push(&self, result: Result<AccountSet, FetchError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountSource for MockAccountSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_accounts(&self) -> Result<AccountSet, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// History store whose writes always fail.
#[derive(Default)]
pub struct FailingHistoryStore;

#[async_trait]
impl HistoryStore for FailingHistoryStore {
    async fn append(&self, _entry: &HistoryEntry) -> Result<(), PersistenceError> {
        Err(PersistenceError::Write {
            path: PathBuf::from("/nonexistent/history.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    async fn read_all(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        Err(PersistenceError::Read {
            path: PathBuf::from("/nonexistent/history.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}
