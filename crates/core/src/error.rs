//! Hermes core errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed transaction field '{field}': {reason}")]
    MalformedTransaction { field: &'static str, reason: String },
}

impl Error {
    /// Shorthand for a shape-mismatch rejection on a named field
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedTransaction {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
