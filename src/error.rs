//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Byte-level media failures live in their own closed enum ([`MediaError`])
//! so callers of the sniffer and duration reader can match them exhaustively.

use thiserror::Error;

/// Failures from the byte-level classification and container parsing routines.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaError {
    #[error("Invalid input: need at least {required} bytes, got {actual}")]
    InvalidInput { required: usize, actual: usize },

    #[error("Movie header marker not found")]
    MarkerNotFound,

    #[error("Truncated data: need {needed} bytes at offset {offset}, only {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Time scale is zero")]
    DivisionByZero,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Unsupported file type: {name}")]
    InvalidFile { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// True when the failure was caused by what the uploader sent rather than by the server.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFile { .. } | Error::Media(MediaError::InvalidInput { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
