//! Service and backend configuration
//!
//! Backends are described by a tagged mapping:
//!
//! ```text
//! { "backend_type": "FileSystem", "file_extension": "yaml", "root_directory": "/srv/hp" }
//! ```
//!
//! and the whole service by a TOML file:
//!
//! ```toml
//! [backend]
//! backend_type = "FileSystem"
//! file_extension = "json"
//! root_directory = "/var/lib/hydropump"
//!
//! [logging]
//! filter = "hydropump=debug"
//! json = false
//! ```

use crate::error::{ServiceError, ServiceResult};
use hydropump_backend::{Backend, BackendType, Codec, FileSystemBackend};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_root_directory() -> PathBuf {
    PathBuf::from(".")
}

/// Backend descriptor, tagged by `backend_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend_type")]
pub enum BackendConfig {
    /// Local directory tree
    FileSystem {
        /// Document format (`json`, `yaml`, `yml`)
        file_extension: Codec,
        /// Existing directory holding `base/` and `template/`
        #[serde(default = "default_root_directory")]
        root_directory: PathBuf,
    },
    /// AWS object storage; recognized but not implemented
    AwsBucket {
        /// Document format
        file_extension: Codec,
        /// Bucket holding the namespaces
        #[serde(default)]
        root_bucket_name: Option<String>,
    },
    /// GCP object storage; recognized but not implemented
    GcpBucket {
        /// Document format
        file_extension: Codec,
        /// Bucket holding the namespaces
        #[serde(default)]
        root_bucket_name: Option<String>,
    },
}

impl BackendConfig {
    /// Filesystem descriptor
    #[must_use]
    pub fn file_system(file_extension: Codec, root_directory: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            file_extension,
            root_directory: root_directory.into(),
        }
    }

    /// Parse a descriptor mapping
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` for an unknown `backend_type`,
    /// a missing field, or an unsupported file extension
    pub fn from_descriptor(descriptor: serde_json::Value) -> ServiceResult<Self> {
        serde_json::from_value(descriptor)
            .map_err(|e| ServiceError::Configuration(format!("invalid backend descriptor: {e}")))
    }

    /// Backend kind named by this descriptor
    #[must_use]
    pub fn backend_type(&self) -> BackendType {
        match self {
            Self::FileSystem { .. } => BackendType::FileSystem,
            Self::AwsBucket { .. } => BackendType::AwsBucket,
            Self::GcpBucket { .. } => BackendType::GcpBucket,
        }
    }

    /// Document format named by this descriptor
    #[must_use]
    pub fn codec(&self) -> Codec {
        match self {
            Self::FileSystem { file_extension, .. }
            | Self::AwsBucket { file_extension, .. }
            | Self::GcpBucket { file_extension, .. } => *file_extension,
        }
    }

    /// Construct the backend this descriptor names
    ///
    /// # Errors
    /// - `ServiceError::Configuration` for backend kinds without an implementation
    /// - `ServiceError::Backend` if the backend rejects its settings
    pub fn build(&self) -> ServiceResult<Arc<dyn Backend>> {
        match self {
            Self::FileSystem {
                file_extension,
                root_directory,
            } => {
                let backend = FileSystemBackend::new(*file_extension, root_directory.clone())?;
                Ok(Arc::new(backend))
            }
            Self::AwsBucket { .. } | Self::GcpBucket { .. } => {
                Err(ServiceError::Configuration(format!(
                    "{} backend is not implemented",
                    self.backend_type()
                )))
            }
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::file_system(Codec::Json, default_root_directory())
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl LoggingConfig {
    /// With filter directives
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// With JSON output toggled
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Storage backend descriptor
    pub backend: BackendConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend descriptor
    #[must_use]
    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// With logging settings
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parse TOML configuration
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` if the document is malformed
    pub fn from_toml_str(content: &str) -> ServiceResult<Self> {
        toml::from_str(content)
            .map_err(|e| ServiceError::Configuration(format!("invalid service config: {e}")))
    }

    /// Load TOML configuration from a file
    ///
    /// # Errors
    /// Returns `ServiceError::ConfigFile` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let config_file_error = |message: String| ServiceError::ConfigFile {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| config_file_error(e.to_string()))?;
        let config = toml::from_str(&content).map_err(|e| config_file_error(e.to_string()))?;

        tracing::debug!(path = %path.display(), "loaded service config");
        Ok(config)
    }

    /// Serialize as TOML
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` if serialization fails
    pub fn to_toml_string(&self) -> ServiceResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ServiceError::Configuration(format!("cannot serialize service config: {e}"))
        })
    }
}
