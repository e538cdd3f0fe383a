//! Error types for Reel

use std::io;
use thiserror::Error;

/// Result type for Reel operations
pub type Result<T> = std::result::Result<T, ReelError>;

/// Errors that can occur in Reel
#[derive(Debug, Error)]
pub enum ReelError {
    /// I/O error from the cassette store
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unknown serializer or matcher, or otherwise unusable options
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cassette contents could not be decoded
    #[error("Invalid cassette format: {0}")]
    InvalidFormat(String),

    /// Cassette contents could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid cassette name
    #[error("Invalid cassette name: {0}")]
    InvalidCassetteName(String),
}

impl ReelError {
    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true for errors raised while validating setup
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidCassetteName(_))
    }
}
