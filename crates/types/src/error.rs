//! Error types for the nearby-types crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors raised while constructing or validating the core value types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypesError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("place missing required field: {0}")]
    IncompletePlace(String),
}
