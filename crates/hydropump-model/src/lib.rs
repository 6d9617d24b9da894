//! Hydropump entity model
//!
//! Value types for the documents a Hydropump store manages:
//!
//! - [`Instruction`]: a configuration document that may inherit from templates
//! - [`Template`]: a reusable configuration fragment referenced by id
//! - [`Metadata`]: bookkeeping shared by both (template list, timestamps, flags)
//! - [`Source`]: the opaque nested payload
//!
//! Entities are plain records. Their persisted shape lives in the
//! [`envelope`] module and is converted explicitly on the storage boundary.
//!
//! # Example
//!
//! ```rust
//! use hydropump_model::{merge, Instruction, Metadata, Source};
//! use serde_json::json;
//!
//! let template: Source = serde_json::from_value(json!({"region": "eu", "port": 80})).unwrap();
//! let own: Source = serde_json::from_value(json!({"port": 8080})).unwrap();
//!
//! let merged = merge(&own, template);
//! assert_eq!(merged["region"], json!("eu"));
//! assert_eq!(merged["port"], json!(8080));
//!
//! let instruction = Instruction::new(None, Metadata::default(), merged);
//! assert!(!instruction.is_compiled());
//! ```

#![warn(unreachable_pub)]

pub mod entity;
pub mod envelope;
pub mod merge;

pub use entity::{generate_id, Instruction, Metadata, Template};
pub use envelope::{InstructionEnvelope, TemplateEnvelope};
pub use merge::{merge, Source};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
