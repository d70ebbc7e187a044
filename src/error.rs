//! # Error Types
//!
//! Custom error types for Garden Humidity using `thiserror`.

use thiserror::Error;

/// Main error type for Garden Humidity
#[derive(Debug, Error)]
pub enum HumidityError {
    /// Serial port errors (open, enumeration)
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Record ended before all bytes arrived
    #[error("Truncated record: expected {expected} bytes: {source}")]
    TruncatedRecord {
        expected: usize,
        #[source]
        source: std::io::Error,
    },

    /// ZIP container errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// CSV serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON rendering errors (verbose output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// No home directory to root the default archive path in
    #[error("Home directory unavailable, set archive.root_dir or --output-dir")]
    HomeDirUnavailable,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Garden Humidity
pub type Result<T> = std::result::Result<T, HumidityError>;
