//! Attachment storage errors.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload exceeds the configured maximum.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// MIME type not in the allow list.
    #[error("MIME type '{mime_type}' is not allowed")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// Upload has no content.
    #[error("file is empty")]
    EmptyFile,

    /// Object not found.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key or backend message.
        key: String,
    },

    /// Backend could not be configured.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend operation failed.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::FileTooLarge { .. } => 413,
            Self::InvalidMimeType { .. } => 415,
            Self::EmptyFile => 400,
            Self::NotFound { .. } => 404,
            Self::Configuration(_) | Self::Operation(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::InvalidMimeType { .. } => "INVALID_MIME_TYPE",
            Self::EmptyFile => "EMPTY_FILE",
            Self::NotFound { .. } => "FILE_NOT_FOUND",
            Self::Configuration(_) => "STORAGE_CONFIGURATION_ERROR",
            Self::Operation(_) => "STORAGE_ERROR",
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}
