//! Integration tests for check-in tokens and receipt extraction.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p checkin-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `token_redemption` - Issue, persist and redeem tokens end to end
//! - `receipt_extraction` - Realistic model responses through the validator
//!
//! This library holds the shared fixtures.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use checkin_core::{
    CheckInConfig, InMemoryTokenStore, StoredToken, TokenHash, TokenService, TokenStore, VisitId,
};

/// Base URL used by test configurations.
pub const TEST_BASE_URL: &str = "https://checkin.test";

/// Shared state for a redemption test.
pub struct TestContext {
    pub service: TokenService,
    pub store: Arc<InMemoryTokenStore>,
}

impl TestContext {
    /// A context with a 7-day token lifetime and an empty store.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is invalid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl_days(7)
    }

    /// A context with the given token lifetime.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_ttl_days(days: i64) -> Self {
        let config = CheckInConfig::new(TEST_BASE_URL, days).expect("valid test config");
        Self {
            service: TokenService::new(&config),
            store: Arc::new(InMemoryTokenStore::new()),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh, unique visit id.
///
/// # Panics
///
/// Never in practice; a UUID is always a valid visit id.
#[must_use]
#[allow(clippy::expect_used)]
pub fn unique_visit() -> VisitId {
    VisitId::parse(&uuid::Uuid::new_v4().to_string()).expect("uuid is a valid visit id")
}

/// Error returned by [`FailingStore`].
#[derive(Debug, Error)]
#[error("database offline")]
pub struct DatabaseOffline;

/// A store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

impl TokenStore for FailingStore {
    type Error = DatabaseOffline;

    async fn save(&self, _visit_id: &VisitId, _record: StoredToken) -> Result<(), Self::Error> {
        Err(DatabaseOffline)
    }

    async fn load(&self, _visit_id: &VisitId) -> Result<Option<StoredToken>, Self::Error> {
        Err(DatabaseOffline)
    }

    async fn consume(
        &self,
        _visit_id: &VisitId,
        _expected: &TokenHash,
    ) -> Result<bool, Self::Error> {
        Err(DatabaseOffline)
    }
}

/// A store that loads records normally but whose conditional delete always
/// loses the race, as if another request consumed the token first.
#[derive(Debug)]
pub struct LosingRaceStore {
    pub record: StoredToken,
}

impl LosingRaceStore {
    /// A store holding `record`.
    #[must_use]
    pub const fn new(token_hash: TokenHash, expires_at: DateTime<Utc>) -> Self {
        Self {
            record: StoredToken {
                token_hash,
                expires_at,
            },
        }
    }
}

impl TokenStore for LosingRaceStore {
    type Error = DatabaseOffline;

    async fn save(&self, _visit_id: &VisitId, _record: StoredToken) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn load(&self, _visit_id: &VisitId) -> Result<Option<StoredToken>, Self::Error> {
        Ok(Some(self.record.clone()))
    }

    async fn consume(
        &self,
        _visit_id: &VisitId,
        _expected: &TokenHash,
    ) -> Result<bool, Self::Error> {
        Ok(false)
    }
}
