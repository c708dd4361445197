//! Check-in token commands.
//!
//! # Usage
//!
//! ```bash
//! # Issue a token for a visit (prints the redemption link once)
//! checkin-cli token issue --visit abc123
//!
//! # Hash a plaintext token the way it is stored
//! checkin-cli token hash <plaintext>
//!
//! # Show whether a stored expiry has passed
//! checkin-cli token status --expires-at 2026-11-01T00:00:00Z
//!
//! # Check a presented token against a stored record (does not consume it)
//! checkin-cli token check --hash <hex> --expires-at <rfc3339> <plaintext>
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKIN_BASE_URL` - Base URL for redemption links (`issue` only)
//! - `CHECKIN_TOKEN_TTL_DAYS` - Default token lifetime (`issue` only)

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use checkin_core::token::{ExpiryInput, check_presented, days_remaining, is_expired};
use checkin_core::{
    CheckInConfig, ConfigError, StoredToken, TokenError, TokenHash, TokenService, VisitId,
    VisitIdError,
};

/// Errors that can occur during token commands.
#[derive(Debug, Error)]
pub enum TokenCommandError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid visit id.
    #[error("invalid visit id: {0}")]
    InvalidVisitId(#[from] VisitIdError),

    /// Token issuance failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Invalid expiry value.
    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),

    /// Output serialization failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Machine-readable output of `token issue --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueOutput<'a> {
    visit_id: &'a VisitId,
    redemption_url: &'a str,
    stored: StoredToken,
}

/// Issue a token for a visit.
///
/// The plaintext only appears inside the printed redemption URL; persist the
/// printed hash and expiry.
///
/// # Errors
///
/// Returns an error if configuration is missing, the visit id is invalid, or
/// the random source fails.
#[allow(clippy::print_stdout)]
pub fn issue(visit: &str, ttl_days: Option<i64>, json: bool) -> Result<(), TokenCommandError> {
    dotenvy::dotenv().ok();

    let mut config = CheckInConfig::from_env()?;
    if let Some(days) = ttl_days {
        config = CheckInConfig::new(config.base_url.as_str(), days)?;
    }

    let visit_id = VisitId::parse(visit)?;
    let service = TokenService::new(&config);
    let now = Utc::now();
    let issued = service.issue(&visit_id, now)?;

    tracing::info!(
        visit_id = %visit_id,
        expires_at = %issued.expires_at,
        "Issued check-in token"
    );

    if json {
        let output = IssueOutput {
            visit_id: &visit_id,
            redemption_url: issued.redemption_url.as_str(),
            stored: issued.stored(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Visit:       {visit_id}");
        println!("Token hash:  {}", issued.token_hash);
        println!(
            "Expires at:  {} ({} days)",
            issued.expires_at.to_rfc3339(),
            days_remaining(issued.expires_at, now)
        );
        println!("Link:        {}", issued.redemption_url);
        println!();
        println!("The link contains the only copy of the token. Store the hash, not the link.");
    }

    Ok(())
}

/// Print the stored form of a plaintext token.
#[allow(clippy::print_stdout)]
pub fn hash(plaintext: &str) {
    println!("{}", checkin_core::token::hash_token(plaintext.trim()));
}

/// Print expiry status for a stored expiry value.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD`, or Unix milliseconds.
///
/// # Errors
///
/// Returns `TokenCommandError::InvalidExpiry` if the value cannot be read.
#[allow(clippy::print_stdout)]
pub fn status(expires_at: &str) -> Result<(), TokenCommandError> {
    let input = parse_expiry_arg(expires_at);
    let at = input
        .normalize()
        .map_err(|e| TokenCommandError::InvalidExpiry(e.to_string()))?;
    let now = Utc::now();

    println!("Expires at:     {}", at.to_rfc3339());
    println!("Expired:        {}", is_expired(at, now));
    println!("Days remaining: {}", days_remaining(at, now));
    Ok(())
}

/// Check a presented token against a stored hash and expiry.
///
/// Returns whether the token would be accepted. The reason for a rejection
/// is logged at debug level only.
///
/// # Errors
///
/// Returns `TokenCommandError::InvalidExpiry` if the expiry cannot be read.
#[allow(clippy::print_stdout)]
pub fn check(
    stored_hash: &str,
    expires_at: &str,
    plaintext: &str,
) -> Result<bool, TokenCommandError> {
    let expires_at: DateTime<Utc> = parse_expiry_arg(expires_at)
        .normalize()
        .map_err(|e| TokenCommandError::InvalidExpiry(e.to_string()))?;

    let record = StoredToken {
        token_hash: TokenHash::from_stored(stored_hash),
        expires_at,
    };

    match check_presented(&record, plaintext.trim(), Utc::now()) {
        Ok(()) => {
            println!("valid");
            Ok(true)
        }
        Err(reason) => {
            tracing::debug!(reason = %reason, "Token check failed");
            println!("invalid or expired token");
            Ok(false)
        }
    }
}

/// Numbers are Unix milliseconds; everything else is text.
fn parse_expiry_arg(raw: &str) -> ExpiryInput {
    raw.trim()
        .parse::<i64>()
        .map_or_else(|_| ExpiryInput::from(raw), ExpiryInput::UnixMillis)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use checkin_core::token::hash_token;

    use super::*;

    #[test]
    fn test_parse_expiry_arg_millis() {
        assert_eq!(
            parse_expiry_arg("1767225600000"),
            ExpiryInput::UnixMillis(1_767_225_600_000)
        );
    }

    #[test]
    fn test_parse_expiry_arg_text() {
        assert_eq!(
            parse_expiry_arg("2026-01-01"),
            ExpiryInput::Text("2026-01-01".to_owned())
        );
    }

    #[test]
    fn test_check_valid_token() {
        let expires = (Utc::now() + TimeDelta::days(1)).to_rfc3339();
        let hash = hash_token("tok");
        assert!(check(hash.as_str(), &expires, "tok").unwrap());
    }

    #[test]
    fn test_check_wrong_token() {
        let expires = (Utc::now() + TimeDelta::days(1)).to_rfc3339();
        let hash = hash_token("tok");
        assert!(!check(hash.as_str(), &expires, "other").unwrap());
    }

    #[test]
    fn test_check_expired_token() {
        let expires = (Utc::now() - TimeDelta::days(1)).to_rfc3339();
        let hash = hash_token("tok");
        assert!(!check(hash.as_str(), &expires, "tok").unwrap());
    }

    #[test]
    fn test_check_rejects_unreadable_expiry() {
        assert!(matches!(
            check("abc", "whenever", "tok"),
            Err(TokenCommandError::InvalidExpiry(_))
        ));
    }
}
