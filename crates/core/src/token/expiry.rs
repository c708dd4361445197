//! Token expiry checks.
//!
//! Expiry values reach us in whatever shape the store returns them, so they
//! are normalized to `DateTime<Utc>` first. Anything that fails to normalize
//! counts as expired.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::warn;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Errors that can occur when normalizing an [`ExpiryInput`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpiryParseError {
    /// The text is not a recognized date format.
    #[error("unrecognized expiry format: {0:?}")]
    UnrecognizedFormat(String),
    /// The numeric value is outside the representable range.
    #[error("expiry timestamp out of range")]
    OutOfRange,
}

/// An expiry as stored, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryInput {
    /// Already an absolute instant.
    At(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    UnixMillis(i64),
    /// Document-store timestamp split into seconds and nanoseconds.
    Timestamp {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanos: u32,
    },
    /// Text: RFC 3339, RFC 2822, `YYYY-MM-DDTHH:MM:SS` (UTC) or
    /// `YYYY-MM-DD` (midnight UTC).
    Text(String),
}

impl ExpiryInput {
    /// Normalize to an absolute UTC instant.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryParseError` if the text is not a recognized format or
    /// a numeric value is out of range.
    pub fn normalize(&self) -> Result<DateTime<Utc>, ExpiryParseError> {
        match self {
            Self::At(at) => Ok(*at),
            Self::UnixMillis(ms) => {
                DateTime::from_timestamp_millis(*ms).ok_or(ExpiryParseError::OutOfRange)
            }
            Self::Timestamp { seconds, nanos } => {
                DateTime::from_timestamp(*seconds, *nanos).ok_or(ExpiryParseError::OutOfRange)
            }
            Self::Text(text) => parse_text(text),
        }
    }
}

impl From<DateTime<Utc>> for ExpiryInput {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl From<&str> for ExpiryInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for ExpiryInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

fn parse_text(text: &str) -> Result<DateTime<Utc>, ExpiryParseError> {
    let text = text.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }

    if let Ok(at) = DateTime::parse_from_rfc2822(text) {
        return Ok(at.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ExpiryParseError::UnrecognizedFormat(text.to_owned()))
}

/// Whether a token with this expiry is no longer accepted at `now`.
///
/// A token is valid up to and including its expiry instant. An expiry that
/// cannot be normalized is treated as expired.
pub fn is_expired(expires_at: impl Into<ExpiryInput>, now: DateTime<Utc>) -> bool {
    match expires_at.into().normalize() {
        Ok(at) => now > at,
        Err(e) => {
            warn!(error = %e, "Unusable token expiry, treating token as expired");
            true
        }
    }
}

/// Whole days until expiry, rounded up. Negative once expired.
///
/// For display only; use [`is_expired`] to decide validity.
#[must_use]
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expires_at - now).num_milliseconds();

    // Integer division truncates toward zero, which is already the ceiling
    // for negative values.
    let days = millis / MILLIS_PER_DAY;
    if millis % MILLIS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}
