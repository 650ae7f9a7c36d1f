//! Reduce an account set to a single net-worth figure.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{AccountBalance, AccountSet, NetWorthSnapshot};

/// Currency reported when no account qualifies.
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetWorth {
    pub total: Decimal,
    pub currency: String,
    pub breakdown: Vec<AccountBalance>,
}

#[derive(Debug, thiserror::Error)]
pub enum CalculationError {
    #[error("net worth total overflowed while adding account {account}")]
    Overflow { account: String },
}

/// True for currency codes shaped like a URL (`https://…`), which SimpleFIN
/// uses for non-monetary units such as reward points.
pub fn is_custom_unit(currency: &str) -> bool {
    let Some((scheme, _)) = currency.split_once("://") else {
        return false;
    };
    scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Sum balances of every account denominated in a real currency.
///
/// The result carries the currency of the last included account. Mixed
/// currencies are summed as-is; there is no conversion. A total outside the
/// decimal range is an error rather than a wrapped or saturated value.
pub fn compute(accounts: &AccountSet) -> Result<NetWorth, CalculationError> {
    compute_with_fallback(accounts, DEFAULT_CURRENCY)
}

pub fn compute_with_fallback(
    accounts: &AccountSet,
    fallback_currency: &str,
) -> Result<NetWorth, CalculationError> {
    let mut total = Decimal::ZERO;
    let mut currency: Option<&str> = None;
    let mut breakdown = Vec::with_capacity(accounts.accounts.len());

    for account in &accounts.accounts {
        if is_custom_unit(&account.currency) {
            continue;
        }

        let balance = match Decimal::from_str(account.balance.trim()) {
            Ok(balance) => balance,
            Err(err) => {
                warn!(
                    account = %account.name,
                    balance = %account.balance,
                    error = %err,
                    "skipping account with unparseable balance"
                );
                continue;
            }
        };

        total = total
            .checked_add(balance)
            .ok_or_else(|| CalculationError::Overflow {
                account: account.name.clone(),
            })?;
        currency = Some(account.currency.as_str());
        breakdown.push(AccountBalance::new(account.name.clone(), balance));
    }

    Ok(NetWorth {
        total,
        currency: currency.unwrap_or(fallback_currency).to_string(),
        breakdown,
    })
}

/// Compute and package the result as a cacheable snapshot.
pub fn snapshot(
    accounts: &AccountSet,
    fallback_currency: &str,
    computed_at: DateTime<Utc>,
) -> Result<NetWorthSnapshot, CalculationError> {
    let net_worth = compute_with_fallback(accounts, fallback_currency)?;
    Ok(NetWorthSnapshot {
        net_worth: net_worth.total,
        currency: net_worth.currency,
        computed_at,
        accounts: net_worth.breakdown,
        warnings: accounts.warnings.clone(),
    })
}
