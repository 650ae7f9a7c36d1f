//! Periodic fetch, compute, cache and record cycle.
//!
//! The scheduler starts `Uninitialized`. A successful [`RefreshScheduler::initialize`]
//! moves it to `Active`, after which [`RefreshScheduler::spawn`] re-runs the cycle
//! on a timer until shutdown. Failed scheduled cycles leave the cached snapshot
//! alone. Cycles never overlap: each one holds `cycle` from fetch through the
//! history append.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::SnapshotCache;
use crate::clock::{Clock, SystemClock};
use crate::duration::format_duration;
use crate::models::{HistoryEntry, NetWorthSnapshot};
use crate::networth::{self, DEFAULT_CURRENCY};
use crate::shutdown::Shutdown;
use crate::storage::HistoryStore;
use crate::sync::{AccountSource, FetchError};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Uninitialized,
    Active,
}

pub struct RefreshScheduler {
    source: Arc<dyn AccountSource>,
    history: Arc<dyn HistoryStore>,
    cache: Arc<SnapshotCache>,
    clock: Arc<dyn Clock>,
    fallback_currency: String,
    cycle: Mutex<()>,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<dyn AccountSource>,
        history: Arc<dyn HistoryStore>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            source,
            history,
            cache,
            clock: Arc::new(SystemClock),
            fallback_currency: DEFAULT_CURRENCY.to_string(),
            cycle: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fallback_currency(mut self, currency: impl Into<String>) -> Self {
        self.fallback_currency = currency.into();
        self
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub fn state(&self) -> SchedulerState {
        if self.cache.is_populated() {
            SchedulerState::Active
        } else {
            SchedulerState::Uninitialized
        }
    }

    /// Run the first cycle. An error here means there is nothing to serve.
    pub async fn initialize(&self) -> Result<Arc<NetWorthSnapshot>, FetchError> {
        info!(source = self.source.name(), "running initial refresh");
        self.refresh_once().await
    }

    /// One full cycle.
    ///
    /// The cache is replaced before history is written. A history failure is
    /// logged and does not undo the cache update or fail the cycle. Balances
    /// whose total cannot be represented fail the cycle before the cache is
    /// touched.
    pub async fn refresh_once(&self) -> Result<Arc<NetWorthSnapshot>, FetchError> {
        let _guard = self.cycle.lock().await;

        let accounts = self.source.fetch_accounts().await?;
        let computed = networth::snapshot(&accounts, &self.fallback_currency, self.clock.now())
            .map_err(|err| FetchError::InvalidResponse(err.to_string()))?;
        let snapshot = self.cache.replace(computed);

        info!(
            net_worth = %snapshot.net_worth,
            currency = %snapshot.currency,
            accounts = snapshot.account_count(),
            warnings = snapshot.warnings.len(),
            "refresh complete"
        );

        let entry = HistoryEntry::from_snapshot(&snapshot);
        if let Err(err) = self.history.append(&entry).await {
            error!(error = %err, "failed to record net worth history");
        }

        Ok(snapshot)
    }

    /// Run scheduled cycles until `shutdown` fires.
    pub fn spawn(
        self: Arc<Self>,
        interval: Duration,
        jitter: Duration,
        shutdown: Shutdown,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(interval, jitter, shutdown).await })
    }

    pub async fn run(&self, interval: Duration, jitter: Duration, shutdown: Shutdown) {
        info!(
            interval = %format_duration(interval),
            jitter = %format_duration(jitter),
            "refresh scheduler started"
        );

        loop {
            let delay = compute_next_delay(interval, jitter);
            debug!(delay_ms = delay.as_millis() as u64, "next refresh scheduled");

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            if let Err(err) = self.refresh_once().await {
                log_failure(&err);
            }
        }

        info!("refresh scheduler stopped");
    }
}

fn log_failure(err: &FetchError) {
    if err.needs_operator() {
        error!(error = %err, "scheduled refresh failed; keeping previous snapshot");
    } else {
        warn!(error = %err, "scheduled refresh failed; keeping previous snapshot");
    }
}

/// `interval` shifted by a uniform offset in `[-jitter, +jitter]`, never
/// shorter than one second once jitter is in play.
pub fn compute_next_delay(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval;
    }

    let base_ms = interval.as_millis().min(u128::from(u64::MAX)) as i128;
    let jitter_ms = jitter.as_millis().min(u128::from(u64::MAX)) as i128;
    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);

    let min_ms = 1_000_i128;
    let max_ms = i128::from(u64::MAX);
    let delay_ms = (base_ms + offset).clamp(min_ms, max_ms) as u64;
    Duration::from_millis(delay_ms)
}
