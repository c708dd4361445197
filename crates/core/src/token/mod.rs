//! Check-in tokens.
//!
//! A check-in token is 32 bytes from the operating system CSPRNG, encoded as
//! unpadded base64url so it can sit in a query string as-is. The plaintext is
//! shown to the visitor exactly once (as a link or QR code); only its SHA-256
//! digest and the expiry are persisted.
//!
//! # Redemption contract
//!
//! Tokens are single-use. [`redeem`] loads the stored record, checks expiry
//! and hash, then asks the [`TokenStore`] to clear the record *only if it
//! still holds the same hash*. That compare-and-delete must be atomic in the
//! store (a transaction or conditional delete) so two concurrent redemptions
//! of one token cannot both succeed.

mod error;
mod expiry;
mod redemption;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::TryRngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use crate::config::CheckInConfig;
use crate::types::VisitId;

pub use error::{RedemptionError, TokenError};
pub use expiry::{ExpiryInput, ExpiryParseError, days_remaining, is_expired};
pub use redemption::{
    InMemoryTokenStore, RejectReason, Redemption, StoreUnavailable, TokenStore, check_presented,
    redeem,
};

/// Number of random bytes in a token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token: 32 bytes as unpadded base64url.
pub const TOKEN_LENGTH: usize = 43;

/// Path of the redemption page, relative to the base URL.
pub const REDEMPTION_PATH: &str = "check-in";

/// Query parameter carrying the visit id.
pub const VISIT_PARAM: &str = "v";

/// Query parameter carrying the plaintext token.
pub const TOKEN_PARAM: &str = "t";

/// SHA-256 digest of a plaintext token, lowercase hex.
///
/// This is the only form of a token that is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHash(String);

impl TokenHash {
    /// Wrap a digest loaded from storage.
    ///
    /// The value is normalized to lowercase. No further validation is done;
    /// a malformed stored digest simply never matches.
    #[must_use]
    pub fn from_stored(hex_digest: &str) -> Self {
        Self(hex_digest.trim().to_ascii_lowercase())
    }

    /// Returns the digest as a hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare two digests without short-circuiting on the first difference.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        constant_time_compare(&self.0, &other.0)
    }
}

impl std::fmt::Display for TokenHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted half of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    /// Digest of the plaintext.
    pub token_hash: TokenHash,
    /// Last instant at which the token is accepted.
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued token.
///
/// Holds the plaintext, which must be handed to the visitor and then
/// dropped. Persist [`IssuedToken::stored`] only.
pub struct IssuedToken {
    /// Visit the token redeems.
    pub visit_id: VisitId,
    /// The secret shown to the visitor.
    pub plaintext: SecretString,
    /// Digest to persist.
    pub token_hash: TokenHash,
    /// Expiry to persist.
    pub expires_at: DateTime<Utc>,
    /// Link for the visitor (or for a QR code).
    pub redemption_url: Url,
}

impl IssuedToken {
    /// The record the caller persists for this visit.
    #[must_use]
    pub fn stored(&self) -> StoredToken {
        StoredToken {
            token_hash: self.token_hash.clone(),
            expires_at: self.expires_at,
        }
    }
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("visit_id", &self.visit_id)
            .field("plaintext", &"[REDACTED]")
            .field("token_hash", &self.token_hash)
            .field("expires_at", &self.expires_at)
            .field("redemption_url", &"[REDACTED]")
            .finish()
    }
}

/// Issues check-in tokens and builds their redemption links.
#[derive(Debug, Clone)]
pub struct TokenService {
    base_url: Url,
    token_ttl: TimeDelta,
}

impl TokenService {
    /// Create a token service from configuration.
    #[must_use]
    pub fn new(config: &CheckInConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            token_ttl: config.token_ttl,
        }
    }

    /// Lifetime given to tokens issued by this service.
    #[must_use]
    pub const fn token_ttl(&self) -> TimeDelta {
        self.token_ttl
    }

    /// Generate a new plaintext token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EntropyUnavailable` if the operating system
    /// random source fails.
    pub fn generate_token(&self) -> Result<SecretString, TokenError> {
        generate_token()
    }

    /// Hash a plaintext token.
    #[must_use]
    pub fn hash_token(&self, plaintext: &str) -> TokenHash {
        hash_token(plaintext)
    }

    /// Build `<base>/check-in?v=<visit_id>&t=<token>`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidBaseUrl` if the base URL cannot carry a
    /// path. Configuration validation rules this out.
    pub fn build_redemption_url(
        &self,
        visit_id: &VisitId,
        plaintext: &str,
    ) -> Result<Url, TokenError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| TokenError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(REDEMPTION_PATH);

        url.query_pairs_mut()
            .clear()
            .append_pair(VISIT_PARAM, visit_id.as_str())
            .append_pair(TOKEN_PARAM, plaintext);

        Ok(url)
    }

    /// Issue a token for a visit, expiring `token_ttl` after `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the random source fails, the expiry overflows,
    /// or the redemption URL cannot be built.
    #[instrument(skip(self, visit_id), fields(visit_id = %visit_id))]
    pub fn issue(&self, visit_id: &VisitId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let plaintext = self.generate_token()?;
        let token_hash = self.hash_token(plaintext.expose_secret());
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let redemption_url = self.build_redemption_url(visit_id, plaintext.expose_secret())?;

        debug!(%expires_at, "Issued check-in token");

        Ok(IssuedToken {
            visit_id: visit_id.clone(),
            plaintext,
            token_hash,
            expires_at,
            redemption_url,
        })
    }
}

/// Generate a new plaintext token (32 bytes, base64url, no padding).
///
/// Draws from the operating system random source directly so that a failing
/// source surfaces as an error instead of a weaker token.
///
/// # Errors
///
/// Returns `TokenError::EntropyUnavailable` if the random source fails.
pub fn generate_token() -> Result<SecretString, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::EntropyUnavailable(e.to_string()))?;

    Ok(SecretString::from(URL_SAFE_NO_PAD.encode(bytes)))
}

/// SHA-256 of a plaintext token, hex-encoded.
#[must_use]
pub fn hash_token(plaintext: &str) -> TokenHash {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    TokenHash(hex::encode(hasher.finalize()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeZone;

    use super::*;

    fn service() -> TokenService {
        TokenService::new(&CheckInConfig::new("https://app.example.com", 7).unwrap())
    }

    fn visit(id: &str) -> VisitId {
        VisitId::parse(id).unwrap()
    }

    #[test]
    fn test_token_is_url_safe_and_full_length() {
        let token = generate_token().unwrap();
        let token = token.expose_secret();

        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );

        let decoded = URL_SAFE_NO_PAD.decode(token).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..256)
            .map(|_| generate_token().unwrap().expose_secret().to_owned())
            .collect();
        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_token("some-check-in-token");
        let b = hash_token("some-check-in-token");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash_token("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_differs_for_different_tokens() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn test_hash_at_issue_matches_hash_at_redemption() {
        let issued = service().issue(&visit("v1"), Utc::now()).unwrap();
        let recomputed = hash_token(issued.plaintext.expose_secret());
        assert!(issued.token_hash.matches(&recomputed));
    }

    #[test]
    fn test_stored_hash_is_normalized() {
        let hash = hash_token("abc");
        let stored = TokenHash::from_stored(&hash.as_str().to_ascii_uppercase());
        assert!(stored.matches(&hash));
    }

    #[test]
    fn test_build_redemption_url() {
        let url = service()
            .build_redemption_url(&visit("visit-42"), "AbC_-9")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.example.com/check-in?v=visit-42&t=AbC_-9"
        );
    }

    #[test]
    fn test_build_redemption_url_keeps_path_prefix() {
        let config = CheckInConfig::new("https://example.com/app/", 7).unwrap();
        let url = TokenService::new(&config)
            .build_redemption_url(&visit("x"), "tok")
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/app/check-in?v=x&t=tok");
    }

    #[test]
    fn test_build_redemption_url_escapes_visit_id() {
        let url = service()
            .build_redemption_url(&visit("a b&c"), "tok")
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("v".to_owned(), "a b&c".to_owned()),
                ("t".to_owned(), "tok".to_owned()),
            ]
        );
    }

    #[test]
    fn test_generated_token_needs_no_escaping() {
        let svc = service();
        let token = svc.generate_token().unwrap();
        let url = svc
            .build_redemption_url(&visit("v"), token.expose_secret())
            .unwrap();
        assert!(url.as_str().ends_with(token.expose_secret()));
    }

    #[test]
    fn test_issue_sets_expiry_from_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let issued = service().issue(&visit("v1"), now).unwrap();

        assert_eq!(
            issued.expires_at,
            Utc.with_ymd_and_hms(2026, 3, 8, 12, 0, 0).unwrap()
        );
        assert_eq!(issued.stored().token_hash, issued.token_hash);
        assert_eq!(issued.stored().expires_at, issued.expires_at);
    }

    #[test]
    fn test_issued_token_debug_redacts_plaintext() {
        let issued = service().issue(&visit("v1"), Utc::now()).unwrap();
        let debug = format!("{issued:?}");

        assert!(!debug.contains(issued.plaintext.expose_secret()));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains(issued.token_hash.as_str()));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
