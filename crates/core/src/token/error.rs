//! Token error types.

use thiserror::Error;

/// Errors that can occur while issuing tokens.
///
/// Rejected redemptions are not errors; see [`super::Redemption`].
#[derive(Debug, Error)]
pub enum TokenError {
    /// The operating system random source failed.
    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    /// The configured base URL cannot carry a path.
    #[error("base URL cannot be used for redemption links: {0}")]
    InvalidBaseUrl(String),

    /// Expiry arithmetic overflowed.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}

/// Errors that can occur during redemption.
#[derive(Debug, Error)]
pub enum RedemptionError<E>
where
    E: std::error::Error + 'static,
{
    /// The backing store failed.
    #[error("token store error: {0}")]
    Store(#[source] E),
}
