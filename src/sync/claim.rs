//! One-time exchange of a SimpleFIN setup token for a long-lived access URL.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use secrecy::SecretString;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("setup token is not valid base64")]
    NotBase64,

    #[error("setup token does not decode to a UTF-8 claim URL")]
    NotUtf8,

    #[error("claim was rejected with HTTP {status}; setup tokens can only be claimed once")]
    Rejected { status: u16 },

    #[error("claim request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("claim succeeded but no access URL was returned")]
    EmptyResponse,
}

/// Decode a setup token into the claim URL it wraps.
pub fn decode_setup_token(token: &str) -> Result<String, ClaimError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| ClaimError::NotBase64)?;
    let url = String::from_utf8(bytes).map_err(|_| ClaimError::NotUtf8)?;
    Ok(url.trim().to_string())
}

/// Claim a setup token. The token is consumed upstream whether or not the
/// caller stores the returned access URL.
pub async fn claim_access_url(token: &str, timeout: Duration) -> Result<SecretString, ClaimError> {
    let claim_url = decode_setup_token(token)?;

    let client = Client::builder().timeout(timeout).build()?;
    let response = client
        .post(&claim_url)
        .header(reqwest::header::CONTENT_LENGTH, "0")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClaimError::Rejected {
            status: status.as_u16(),
        });
    }

    let access_url = response.text().await?.trim().to_string();
    if access_url.is_empty() {
        return Err(ClaimError::EmptyResponse);
    }

    info!("claimed SimpleFIN access URL");
    Ok(SecretString::from(access_url))
}
