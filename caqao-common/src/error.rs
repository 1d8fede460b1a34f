//! Common error types for CAQAO

use thiserror::Error;

/// Common result type for CAQAO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the CAQAO crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Detector label with an empty token (e.g. "" or "brown-")
    #[error("Malformed detection label: {0:?}")]
    MalformedLabel(String),

    /// Detector label that does not name one of the twelve bean categories
    #[error("Unknown bean category {key:?} in label {label:?}")]
    UnknownCategory { label: String, key: String },

    /// Promotion requested while no scratch record is pending
    #[error("No pending assessment to save")]
    NoScratchRecord,

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
