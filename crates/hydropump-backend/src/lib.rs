//! Hydropump storage backends
//!
//! Persists instructions and templates and compiles instructions against
//! the templates they declare.
//!
//! # Architecture
//!
//! ```text
//! Service → dyn Backend ─┬─ get/put/delete (base, template)
//!                        └─ compile_instruction → TemplateLookup → merge
//!                                │
//!                         FileSystemBackend → Codec (json | yaml)
//!                                │
//!                         {root}/{namespace}/{id}.{ext}
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use hydropump_backend::{Backend, Codec, FileSystemBackend};
//! use hydropump_model::{Instruction, Metadata, Source};
//!
//! # fn example() -> Result<(), hydropump_backend::BackendError> {
//! let backend = FileSystemBackend::new(Codec::Yaml, "/var/lib/hydropump")?;
//!
//! let stored = backend.put_base(Instruction::new(None, Metadata::new(), Source::new()))?;
//! let compiled = backend.compile_instruction(backend.get_base(&stored.id)?)?;
//! assert!(compiled.is_compiled());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod codec;
pub mod compile;
pub mod error;
pub mod fs;

pub use backend::{validate_id, Backend, BackendType, Namespace};
pub use codec::Codec;
pub use compile::{compile_instruction, resolve_templates, TemplateLookup};
pub use error::{BackendError, BackendResult};
pub use fs::FileSystemBackend;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
