//! Token redemption.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{RedemptionError, StoredToken, TokenHash, hash_token, is_expired};
use crate::types::VisitId;

/// Persistence for issued tokens, keyed by visit.
///
/// Implementations sit in front of whatever database holds visits.
pub trait TokenStore: Send + Sync {
    /// Store failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save (or replace) the token record for a visit.
    fn save(
        &self,
        visit_id: &VisitId,
        record: StoredToken,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Load the token record for a visit.
    fn load(
        &self,
        visit_id: &VisitId,
    ) -> impl Future<Output = Result<Option<StoredToken>, Self::Error>> + Send;

    /// Clear the record for a visit if, and only if, it still holds
    /// `expected`. Returns whether a record was cleared.
    ///
    /// Must be atomic: when several callers race with the same hash, exactly
    /// one may observe `true`.
    fn consume(
        &self,
        visit_id: &VisitId,
        expected: &TokenHash,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Result of a redemption attempt.
///
/// Every failure is the same `Rejected` value so that a caller cannot tell
/// an unknown visit from a wrong or expired token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// The token matched and has been consumed.
    Confirmed,
    /// Invalid or expired token.
    Rejected,
}

impl Redemption {
    /// Whether the visit was confirmed.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Why a redemption was rejected. For logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    Expired,
    Mismatch,
    AlreadyConsumed,
}

impl RejectReason {
    /// Short name for structured logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Mismatch => "mismatch",
            Self::AlreadyConsumed => "already_consumed",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a presented plaintext against a stored record without consuming it.
///
/// # Errors
///
/// Returns the rejection reason. Do not pass it on to the redeeming party.
pub fn check_presented(
    record: &StoredToken,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<(), RejectReason> {
    if is_expired(record.expires_at, now) {
        return Err(RejectReason::Expired);
    }

    if !hash_token(presented).matches(&record.token_hash) {
        return Err(RejectReason::Mismatch);
    }

    Ok(())
}

/// Redeem a presented token for a visit.
///
/// Loads the record, checks expiry and hash, then consumes the record with
/// a compare-and-delete so the token cannot be replayed.
///
/// # Errors
///
/// Returns `RedemptionError::Store` if the store fails. Invalid tokens are
/// not errors; they yield `Ok(Redemption::Rejected)`.
#[instrument(skip(store, visit_id, presented), fields(visit_id = %visit_id))]
pub async fn redeem<S>(
    store: &S,
    visit_id: &VisitId,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<Redemption, RedemptionError<S::Error>>
where
    S: TokenStore,
{
    let Some(record) = store.load(visit_id).await.map_err(RedemptionError::Store)? else {
        return Ok(reject(RejectReason::NotFound));
    };

    if let Err(reason) = check_presented(&record, presented, now) {
        return Ok(reject(reason));
    }

    let consumed = store
        .consume(visit_id, &record.token_hash)
        .await
        .map_err(RedemptionError::Store)?;

    if !consumed {
        return Ok(reject(RejectReason::AlreadyConsumed));
    }

    info!("Check-in token redeemed");
    Ok(Redemption::Confirmed)
}

fn reject(reason: RejectReason) -> Redemption {
    debug!(reason = %reason, "Check-in token rejected");
    Redemption::Rejected
}

/// The in-memory store's lock was poisoned.
#[derive(Debug, Error)]
#[error("token store unavailable: lock poisoned")]
pub struct StoreUnavailable;

/// Process-local [`TokenStore`] for tests and tooling.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    records: Mutex<HashMap<VisitId, StoredToken>>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding (unconsumed) records.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreUnavailable> {
        Ok(self.records.lock().map_err(|_| StoreUnavailable)?.len())
    }

    /// Whether no records are outstanding.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreUnavailable> {
        Ok(self.len()? == 0)
    }
}

impl TokenStore for InMemoryTokenStore {
    type Error = StoreUnavailable;

    async fn save(&self, visit_id: &VisitId, record: StoredToken) -> Result<(), Self::Error> {
        self.records
            .lock()
            .map_err(|_| StoreUnavailable)?
            .insert(visit_id.clone(), record);
        Ok(())
    }

    async fn load(&self, visit_id: &VisitId) -> Result<Option<StoredToken>, Self::Error> {
        Ok(self
            .records
            .lock()
            .map_err(|_| StoreUnavailable)?
            .get(visit_id)
            .cloned())
    }

    async fn consume(&self, visit_id: &VisitId, expected: &TokenHash) -> Result<bool, Self::Error> {
        let mut records = self.records.lock().map_err(|_| StoreUnavailable)?;

        let holds_expected = records
            .get(visit_id)
            .is_some_and(|record| record.token_hash.matches(expected));

        if holds_expected {
            records.remove(visit_id);
        }

        Ok(holds_expected)
    }
}
