//! Error types for collegium-core.

use std::path::{Path, PathBuf};

/// Errors that can occur while loading, configuring, or paging records.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that was being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP fetch failure (connection, status, body)
    #[error("HTTP error: {message}")]
    Http {
        /// Human-readable error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Validation error
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// The record set could not be loaded.
    #[error("Failed to load records from {source_name}: {reason}")]
    LoadFailed {
        /// Path or URL that was being loaded
        source_name: String,
        /// Why the load failed
        reason: String,
        /// Whether the underlying failure was transient
        retryable: bool,
    },

    /// An operation needed the record set before it finished loading.
    #[error("Records are not loaded yet")]
    NotLoaded,

    /// An operation exceeded its deadline.
    #[error("Timed out after {millis}ms")]
    Timeout {
        /// Deadline in milliseconds
        millis: u64,
    },

    /// The owning session was closed or the request was superseded.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Convenience `Result` type alias for Collegium operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Transient failures (I/O, network, deadlines) are retryable; bad
    /// input and bad configuration are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io { .. } => true,
            Error::Http { .. } => true,
            Error::Timeout { .. } => true,
            Error::LoadFailed { retryable, .. } => *retryable,
            Error::NotLoaded => true,
            Error::Json(_) => false,
            Error::Config { .. } => false,
            Error::Validation { .. } => false,
            Error::Cancelled => false,
        }
    }

    /// Creates an I/O error carrying the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new HTTP error.
    pub fn http<S: Into<String>>(message: S) -> Self {
        Error::Http {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Wraps the error that stopped a load of `source_name`.
    pub fn load_failed<S: Into<String>>(source_name: S, cause: &Error) -> Self {
        Error::LoadFailed {
            source_name: source_name.into(),
            reason: cause.to_string(),
            retryable: cause.is_retryable(),
        }
    }
}
