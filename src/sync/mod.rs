//! Fetching account balances from the aggregation service.

pub mod claim;
pub mod sanitize;
pub mod simplefin;

pub use simplefin::SimpleFinClient;

use crate::models::AccountSet;

/// Why a fetch did not produce an account set.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Credentials were rejected; they are stale or revoked and need operator action.
    #[error("authentication rejected by aggregation service; the access URL may be revoked")]
    Auth,

    /// The service refused for payment or rate-limit reasons.
    #[error("aggregation service quota or payment limit reached")]
    Quota,

    #[error("aggregation service returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("request to aggregation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from aggregation service: {0}")]
    InvalidResponse(String),

    #[error("invalid access URL: {0}")]
    InvalidAccessUrl(String),
}

impl FetchError {
    /// Auth failures will not fix themselves on the next cycle.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Self::Auth | Self::InvalidAccessUrl(_))
    }
}

/// Something that can produce the current set of accounts.
///
/// Implementations do one request per call and never retry; retry policy
/// belongs to the refresh scheduler.
#[async_trait::async_trait]
pub trait AccountSource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    async fn fetch_accounts(&self) -> Result<AccountSet, FetchError>;
}
