//! Error types for storage backends
//!
//! Distinguishes the conditions callers branch on:
//! - missing entities (`NotFound`)
//! - unusable identifiers (`InvalidArgument`)
//! - backends that cannot be constructed (`Configuration`)
//! - I/O and codec failures while touching the store

use crate::Namespace;
use std::path::PathBuf;

/// Errors raised by [`Backend`](crate::Backend) implementations
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No persisted entry for the id in this namespace
    #[error("{namespace} ({id}) not found in backend")]
    NotFound {
        /// Namespace that was searched
        namespace: Namespace,
        /// Requested id
        id: String,
    },

    /// Operation received an unusable identifying value
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Backend cannot be constructed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// IO error touching the store
    #[error("io error at {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Entity could not be serialized
    #[error("failed to encode {}: {message}", .path.display())]
    Encode {
        /// Target file
        path: PathBuf,
        /// Serializer message
        message: String,
    },

    /// Stored document could not be deserialized
    #[error("failed to decode {}: {message}", .path.display())]
    Decode {
        /// Source file
        path: PathBuf,
        /// Deserializer message
        message: String,
    },
}

impl BackendError {
    /// Create not-found error
    #[inline]
    pub fn not_found(namespace: Namespace, id: impl Into<String>) -> Self {
        Self::NotFound {
            namespace,
            id: id.into(),
        }
    }

    /// Create IO error for path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the requested entity does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the request itself was malformed
    #[inline]
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Whether the backend could not be constructed
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = BackendError::not_found(Namespace::Template, "net");
        assert_eq!(err.to_string(), "template (net) not found in backend");
        assert!(err.is_not_found());
    }

    #[test]
    fn configuration_display() {
        let err = BackendError::Configuration("root directory missing".to_string());
        assert_eq!(err.to_string(), "configuration error: root directory missing");
        assert!(err.is_configuration());
        assert!(!err.is_not_found());
    }

    #[test]
    fn io_error_keeps_source() {
        let err = BackendError::io_error(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/x"));
    }
}
