//! Error types for the newton_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for newton_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backup document could not be decoded
    #[error("Import failed: {0}")]
    Decode(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store rule violated or store file unusable
    #[error("Store error: {0}")]
    Store(String),

    /// Platform capability refused (live status, background execution)
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
