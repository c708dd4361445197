//! Core types for check-in and receipt handling.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the token and receipt modules.

pub mod id;
pub mod receipt;

pub use id::{VisitId, VisitIdError};
pub use receipt::{
    DEFAULT_CONFIDENCE, DEFAULT_CURRENCY, DomainErrorKind, ExtractionOutcome, ReceiptData,
    ReceiptItem,
};
