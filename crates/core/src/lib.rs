//! Check-in Core - visit verification and receipt extraction.
//!
//! This crate provides the two pieces of the check-in flow that carry real
//! correctness constraints:
//! - [`token`] - single-use redemption tokens (issue, hash, link, expiry,
//!   redeem)
//! - [`receipt`] - validation of vision-model responses describing a receipt
//!
//! # Architecture
//!
//! The crate performs no network or database I/O. Persistence of token
//! records is delegated to a [`TokenStore`] implemented by the caller, and
//! the vision model is called by the caller; only its text response comes
//! in here.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`token`] - Check-in token service and redemption protocol
//! - [`receipt`] - Receipt extraction
//! - [`types`] - Visit ids and receipt records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod receipt;
pub mod token;
pub mod types;

pub use config::{CheckInConfig, ConfigError};
pub use receipt::{RECEIPT_EXTRACTION_PROMPT, extract};
pub use token::{
    InMemoryTokenStore, IssuedToken, Redemption, RedemptionError, StoredToken, TokenError,
    TokenHash, TokenService, TokenStore, redeem,
};
pub use types::*;
