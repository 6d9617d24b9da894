//! Error types for the service facade

use hydropump_backend::BackendError;
use std::path::PathBuf;

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage or compilation failure
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Backend descriptor cannot produce a backend
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Service configuration file could not be read or parsed
    #[error("config file {}: {message}", .path.display())]
    ConfigFile {
        /// File that was being loaded
        path: PathBuf,
        /// Underlying failure
        message: String,
    },
}

impl ServiceError {
    /// Whether the requested entity (or a template it references) does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_not_found())
    }

    /// Whether the request carried an unusable identifier
    #[inline]
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_invalid_argument())
    }

    /// Whether the failure stems from configuration rather than data
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::ConfigFile { .. } => true,
            Self::Backend(e) => e.is_configuration(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
