//! Error types for the record-keeping core.

use thiserror::Error;

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account pending approval")]
    AccountPending,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
