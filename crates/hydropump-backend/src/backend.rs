//! Storage backend contract
//!
//! A backend persists raw instructions ("base" documents) and templates in
//! two independent namespaces. Compilation is a provided method so every
//! concrete backend gets it for free.

use crate::codec::Codec;
use crate::compile;
use crate::error::{BackendError, BackendResult};
use hydropump_model::{Instruction, Template};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity namespace within a backend
///
/// Instruction and template ids never collide because each namespace is
/// stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Raw instructions
    Base,
    /// Reusable templates
    Template,
}

impl Namespace {
    /// Both namespaces, in layout order
    pub const ALL: [Namespace; 2] = [Namespace::Base, Namespace::Template];

    /// Directory / key prefix for this namespace
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend kind tag used by configuration descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendType {
    /// Local directory tree
    FileSystem,
    /// AWS object storage (not implemented)
    AwsBucket,
    /// GCP object storage (not implemented)
    GcpBucket,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileSystem => "FileSystem",
            Self::AwsBucket => "AwsBucket",
            Self::GcpBucket => "GcpBucket",
        };
        f.write_str(name)
    }
}

/// Storage backend for instructions and templates
///
/// All operations perform I/O against the backing store; nothing is cached.
/// Writes replace any previous entry for the same id; deletes of missing
/// entries succeed.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Kind of this backend
    fn backend_type(&self) -> BackendType;

    /// Serialization format used for stored documents
    fn codec(&self) -> Codec;

    /// Fetch a raw instruction
    ///
    /// # Errors
    /// - `BackendError::NotFound` if nothing is stored under `id`
    /// - `BackendError::InvalidArgument` if `id` is unusable
    fn get_base(&self, id: &str) -> BackendResult<Instruction>;

    /// Persist an instruction, replacing any previous entry
    ///
    /// # Errors
    /// Returns error if the id is unusable or the write fails
    fn put_base(&self, instruction: Instruction) -> BackendResult<Instruction>;

    /// Remove a stored instruction if present
    ///
    /// # Errors
    /// Returns error if the id is unusable or removal fails
    fn delete_base(&self, id: &str) -> BackendResult<()>;

    /// Fetch a template
    ///
    /// # Errors
    /// - `BackendError::NotFound` if nothing is stored under `id`
    /// - `BackendError::InvalidArgument` if `id` is unusable
    fn get_template(&self, id: &str) -> BackendResult<Template>;

    /// Persist a template, replacing any previous entry
    ///
    /// # Errors
    /// Returns error if the id is unusable or the write fails
    fn put_template(&self, template: Template) -> BackendResult<Template>;

    /// Remove a stored template if present
    ///
    /// # Errors
    /// Returns error if the id is unusable or removal fails
    fn delete_template(&self, id: &str) -> BackendResult<()>;

    /// Merge the instruction's declared templates into its source
    ///
    /// The result is not written back; see [`compile::compile_instruction`].
    ///
    /// # Errors
    /// Propagates `NotFound` for any missing template
    fn compile_instruction(&self, instruction: Instruction) -> BackendResult<Instruction> {
        compile::compile_instruction(self, instruction)
    }
}

/// Reject identifiers that cannot name a stored entity
///
/// Ids become file names or object keys, so they must be non-empty and must
/// not be `.`/`..` or contain path separators or NUL.
///
/// # Errors
/// Returns `BackendError::InvalidArgument` describing the problem
pub fn validate_id(namespace: Namespace, id: &str) -> BackendResult<()> {
    if id.trim().is_empty() {
        return Err(BackendError::InvalidArgument(format!(
            "{namespace} id is required"
        )));
    }
    if id.contains(['/', '\\', '\0']) || id == "." || id == ".." {
        return Err(BackendError::InvalidArgument(format!(
            "{namespace} id '{}' is not a valid identifier",
            id.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_names() {
        assert_eq!(Namespace::Base.as_str(), "base");
        assert_eq!(Namespace::Template.to_string(), "template");
        assert_eq!(Namespace::ALL.len(), 2);
    }

    #[test]
    fn backend_type_serde_uses_variant_names() {
        let json = serde_json::to_string(&BackendType::FileSystem).unwrap();
        assert_eq!(json, "\"FileSystem\"");
        let parsed: BackendType = serde_json::from_str("\"AwsBucket\"").unwrap();
        assert_eq!(parsed, BackendType::AwsBucket);
        assert_eq!(BackendType::GcpBucket.to_string(), "GcpBucket");
    }

    #[test]
    fn validate_id_accepts_plain_ids() {
        assert!(validate_id(Namespace::Base, "web-frontend").is_ok());
        assert!(validate_id(Namespace::Base, "0b7e3c1a-6f0e-4d0b-9d55-3f0f3b0d4a11").is_ok());
        assert!(validate_id(Namespace::Template, "defaults.v2").is_ok());
    }

    #[test]
    fn validate_id_accepts_inner_dot_runs() {
        assert!(validate_id(Namespace::Base, "v1..2").is_ok());
        assert!(validate_id(Namespace::Template, "..hidden").is_ok());
    }

    #[test]
    fn validate_id_rejects_empty_and_traversal() {
        for bad in ["", "   ", "a/b", ".", "..", "../etc", "a\\b", "nul\0"] {
            let err = validate_id(Namespace::Base, bad).unwrap_err();
            assert!(err.is_invalid_argument(), "accepted {bad:?}");
        }
    }
}
