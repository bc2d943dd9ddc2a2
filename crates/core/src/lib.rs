//! Hermes Core Domain
//!
//! Pure domain types for the Hermes transaction relay.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod error;
pub mod transaction;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use transaction::{Transaction, TransactionBuilder, TransactionId};
