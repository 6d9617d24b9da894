//! Hydropump service
//!
//! Facade for storing instructions and templates and reading instructions
//! back with their templates merged in.
//!
//! # Core Operations
//!
//! - **Create**: assign an id when none is given, stamp `createdAt`, persist
//! - **Read**: fetch raw, or compile against the declared templates
//! - **Update**: replace metadata and/or source under a per-id lock, stamp `modifiedAt`
//! - **Delete**: remove if present
//!
//! # Example
//!
//! ```rust,no_run
//! use hydropump_service::{BackendConfig, Service};
//! use hydropump_model::{Metadata, Source};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), hydropump_service::ServiceError> {
//! let service = Service::from_descriptor(json!({
//!     "backend_type": "FileSystem",
//!     "file_extension": "yaml",
//!     "root_directory": "/var/lib/hydropump",
//! }))?;
//!
//! service.create_template(Metadata::new(), Source::new(), Some("defaults".into()))?;
//! let created = service.create_instruction(
//!     Metadata::new().with_templates(["defaults"]),
//!     Source::new(),
//!     None,
//! )?;
//! let compiled = service.get_compiled_instruction(&created.id)?;
//! assert!(compiled.is_compiled());
//! # let _ = BackendConfig::default();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod locks;
pub mod service;
pub mod telemetry;

pub use config::{BackendConfig, LoggingConfig, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use locks::{IdGuard, LockRegistry};
pub use service::Service;
pub use telemetry::init_tracing;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
