//! Human-readable durations ("30s", "4h", "1d") for config and CLI flags.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Parse a duration string made of an unsigned integer and a unit suffix.
///
/// Units are `d`, `h`, `m` and `s`; input is trimmed and case-insensitive.
///
/// ```
/// use networth::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("4h").unwrap(), Duration::from_secs(4 * 60 * 60));
/// assert_eq!(parse_duration(" 30S ").unwrap(), Duration::from_secs(30));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_ascii_lowercase();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Duration is empty");
    };

    let multiplier = match unit {
        'd' => SECS_PER_DAY,
        'h' => SECS_PER_HOUR,
        'm' => SECS_PER_MINUTE,
        's' => 1,
        _ => anyhow::bail!("Duration must end with d, h, m, or s"),
    };

    let digits = &s[..s.len() - 1];
    let count: u64 = digits
        .parse()
        .with_context(|| format!("Invalid number in duration: {s:?}"))?;
    let secs = count
        .checked_mul(multiplier)
        .context("Duration is too large")?;

    Ok(Duration::from_secs(secs))
}

/// Render a duration using the largest unit that divides it evenly.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    for (unit, size) in [('d', SECS_PER_DAY), ('h', SECS_PER_HOUR), ('m', SECS_PER_MINUTE)] {
        if secs >= size && secs % size == 0 {
            return format!("{}{unit}", secs / size);
        }
    }
    format!("{secs}s")
}

/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
