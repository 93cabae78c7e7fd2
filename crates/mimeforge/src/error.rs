//! Error types for message assembly.

use std::io;
use std::path::PathBuf;

/// Result type alias for message assembly operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message assembly error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Attachment file could not be read.
    #[error("Cannot read attachment {}: {source}", .path.display())]
    Attachment {
        /// Path of the attachment source.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error while reading an attachment stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
}

impl Error {
    /// Creates an attachment read error for the given path.
    #[must_use]
    pub fn attachment(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Attachment {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error came from reading an attachment source.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Attachment { .. } | Self::Io(_))
    }
}
