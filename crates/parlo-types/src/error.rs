//! Error types for the parlo workspace.
//!
//! [`ParloError`] covers the failures that can happen outside the speech
//! path itself: configuration loading and the I/O around it. Speech
//! failures are never fatal and live in `parlo-speech`.

use thiserror::Error;

/// Top-level error type for configuration and setup.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParloError {
    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A configuration file could not be located.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout parlo.
pub type Result<T> = std::result::Result<T, ParloError>;
