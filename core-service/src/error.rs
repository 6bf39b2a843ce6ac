//! Error types for fincafacil-core

use thiserror::Error;

/// Main error type for the fincafacil-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error (export files, audit trails)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or missing identifiers at a service boundary
    #[error("validation error: {0}")]
    Validation(String),

    /// Operational data source failure inside a job
    #[error("source error in {fuente}: {message}")]
    Source { fuente: String, message: String },
}

/// Result type alias for fincafacil-core
pub type Result<T> = std::result::Result<T, Error>;
