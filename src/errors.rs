//! Custom error types for ChainSentry.
//!
//! Every fallible operation in the library returns [`SentryResult`], so the
//! CLI can report a single, readable message for any failure.

use std::path::PathBuf;

/// Input validation failure with the exact message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The main error type for ChainSentry operations.
#[derive(Debug, thiserror::Error)]
pub enum SentryError {
    /// I/O error (store read/write, contract source, etc.)
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Regex compilation error
    #[error("Invalid regex pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rejected user input (address, URL, contract code)
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Record lookup by id failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Input that parsed but cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error for external library errors
    #[error("{context}: {message}")]
    External { context: String, message: String },
}

/// Result type alias using SentryError
pub type SentryResult<T> = Result<T, SentryError>;

impl SentryError {
    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a regex error with pattern context
    pub fn regex(source: regex::Error, pattern: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create an external error with context
    pub fn external(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::External {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for SentryError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = SentryError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            Some(PathBuf::from("/data/chainsentry-demo-data-demo.json")),
        );
        assert!(err.to_string().contains("chainsentry-demo-data-demo.json"));
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: SentryError = ValidationError::new("url", "URL is required").into();
        assert_eq!(err.to_string(), "URL is required");
    }

    #[test]
    fn test_not_found_display() {
        let err = SentryError::not_found("Incident", "1700000000000");
        assert_eq!(err.to_string(), "Incident not found: 1700000000000");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SentryError = io_err.into();
        assert!(matches!(err, SentryError::Io { path: None, .. }));
    }
}
