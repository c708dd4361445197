//! CLI command implementations.

pub mod receipt;
pub mod token;
