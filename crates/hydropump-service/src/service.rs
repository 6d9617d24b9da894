//! Service facade
//!
//! Ties entity lifecycle (ids, timestamps) to a storage backend and
//! compiles instructions on read.

use crate::config::{BackendConfig, ServiceConfig};
use crate::error::ServiceResult;
use crate::locks::LockRegistry;
use hydropump_backend::{validate_id, Backend, Namespace};
use hydropump_model::{Instruction, Metadata, Source, Template};
use std::sync::Arc;

/// Instruction and template store over one backend
///
/// `Send + Sync`; share it behind an `Arc` across threads. Writes to the
/// same id are serialized.
#[derive(Debug, Clone)]
pub struct Service {
    /// Storage backend
    backend: Arc<dyn Backend>,
    /// Per-id write locks
    locks: Arc<LockRegistry>,
}

impl Service {
    /// Create service over a backend
    #[must_use]
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Create service over a shared backend
    #[must_use]
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        tracing::info!(
            backend_type = %backend.backend_type(),
            codec = %backend.codec(),
            "service ready"
        );
        Self {
            backend,
            locks: Arc::new(LockRegistry::new()),
        }
    }

    /// Create service from a backend descriptor
    ///
    /// # Errors
    /// Returns `Configuration` for unimplemented backend kinds, or the
    /// backend's own construction error
    pub fn from_config(config: &BackendConfig) -> ServiceResult<Self> {
        Ok(Self::with_backend(config.build()?))
    }

    /// Create service from an untyped descriptor mapping
    ///
    /// # Errors
    /// Returns `Configuration` if the descriptor is malformed or names an
    /// unknown or unimplemented backend
    pub fn from_descriptor(descriptor: serde_json::Value) -> ServiceResult<Self> {
        Self::from_config(&BackendConfig::from_descriptor(descriptor)?)
    }

    /// Create service from full service configuration
    ///
    /// Tracing is not installed here; see [`crate::telemetry::init_tracing`].
    ///
    /// # Errors
    /// Same as [`Service::from_config`]
    pub fn from_service_config(config: &ServiceConfig) -> ServiceResult<Self> {
        Self::from_config(&config.backend)
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Fetch an instruction, compiling it against its templates when `compile` is set
    ///
    /// # Errors
    /// - `NotFound` if the instruction, or (when compiling) a declared template, is missing
    /// - `InvalidArgument` for an unusable id
    pub fn get_instruction(&self, id: &str, compile: bool) -> ServiceResult<Instruction> {
        let instruction = self.backend.get_base(id)?;
        if !compile {
            return Ok(instruction);
        }
        Ok(self.backend.compile_instruction(instruction)?)
    }

    /// Fetch an instruction with its templates merged in
    ///
    /// # Errors
    /// Same as [`Service::get_instruction`]
    #[inline]
    pub fn get_compiled_instruction(&self, id: &str) -> ServiceResult<Instruction> {
        self.get_instruction(id, true)
    }

    /// Fetch a template as stored
    ///
    /// # Errors
    /// `NotFound` if missing, `InvalidArgument` for an unusable id
    pub fn get_template(&self, id: &str) -> ServiceResult<Template> {
        Ok(self.backend.get_template(id)?)
    }

    /// Create and persist an instruction
    ///
    /// A fresh id is generated when `id` is `None`. An existing instruction
    /// with the same id is replaced.
    ///
    /// # Errors
    /// `InvalidArgument` for an unusable id, or the backend's write error
    pub fn create_instruction(
        &self,
        metadata: Metadata,
        source: Source,
        id: Option<String>,
    ) -> ServiceResult<Instruction> {
        let mut instruction = Instruction::new(id, metadata, source);
        instruction.metadata.stamp_created();
        validate_id(Namespace::Base, &instruction.id)?;

        let _guard = self.locks.acquire(Namespace::Base, &instruction.id);
        let stored = self.backend.put_base(instruction)?;
        tracing::info!(
            id = %stored.id,
            templates = stored.templates().len(),
            "created instruction"
        );
        Ok(stored)
    }

    /// Create and persist a template
    ///
    /// # Errors
    /// `InvalidArgument` for an unusable id, or the backend's write error
    pub fn create_template(
        &self,
        metadata: Metadata,
        source: Source,
        id: Option<String>,
    ) -> ServiceResult<Template> {
        let mut template = Template::new(id, metadata, source);
        template.metadata.stamp_created();
        validate_id(Namespace::Template, &template.id)?;

        let _guard = self.locks.acquire(Namespace::Template, &template.id);
        let stored = self.backend.put_template(template)?;
        tracing::info!(id = %stored.id, "created template");
        Ok(stored)
    }

    /// Replace the provided parts of a stored instruction
    ///
    /// Runs under the instruction's lock so concurrent updates of one id do
    /// not interleave their read-modify-write.
    ///
    /// # Errors
    /// `NotFound` if the instruction does not exist
    pub fn update_instruction(
        &self,
        id: &str,
        metadata: Option<Metadata>,
        source: Option<Source>,
    ) -> ServiceResult<Instruction> {
        validate_id(Namespace::Base, id)?;
        let _guard = self.locks.acquire(Namespace::Base, id);

        let mut instruction = self.backend.get_base(id)?;
        instruction.apply_update(metadata, source);
        let stored = self.backend.put_base(instruction)?;

        tracing::info!(id, "updated instruction");
        Ok(stored)
    }

    /// Replace the provided parts of a stored template
    ///
    /// # Errors
    /// `NotFound` if the template does not exist
    pub fn update_template(
        &self,
        id: &str,
        metadata: Option<Metadata>,
        source: Option<Source>,
    ) -> ServiceResult<Template> {
        validate_id(Namespace::Template, id)?;
        let _guard = self.locks.acquire(Namespace::Template, id);

        let mut template = self.backend.get_template(id)?;
        template.apply_update(metadata, source);
        let stored = self.backend.put_template(template)?;

        tracing::info!(id, "updated template");
        Ok(stored)
    }

    /// Delete an instruction; succeeds when it does not exist
    ///
    /// # Errors
    /// `InvalidArgument` for an unusable id, or the backend's removal error
    pub fn delete_instruction(&self, id: &str) -> ServiceResult<()> {
        validate_id(Namespace::Base, id)?;
        let _guard = self.locks.acquire(Namespace::Base, id);
        Ok(self.backend.delete_base(id)?)
    }

    /// Delete a template; succeeds when it does not exist
    ///
    /// Instructions still referring to it fail to compile afterwards.
    ///
    /// # Errors
    /// `InvalidArgument` for an unusable id, or the backend's removal error
    pub fn delete_template(&self, id: &str) -> ServiceResult<()> {
        validate_id(Namespace::Template, id)?;
        let _guard = self.locks.acquire(Namespace::Template, id);
        Ok(self.backend.delete_template(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydropump_backend::{BackendType, Codec, FileSystemBackend};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn service_is_send_sync() {
        assert_send_sync::<Service>();
    }

    #[test]
    fn locks_released_after_operations() {
        let dir = tempfile::tempdir().unwrap();
        let service = Service::new(FileSystemBackend::new(Codec::Json, dir.path()).unwrap());

        let created = service
            .create_instruction(Metadata::new(), Source::new(), Some("x".into()))
            .unwrap();
        service.update_instruction(&created.id, None, None).unwrap();
        assert!(service.update_template("absent", None, None).is_err());
        service.delete_instruction("x").unwrap();

        assert!(service.locks.is_empty());
    }

    #[test]
    fn from_config_builds_filesystem_backend() {
        let dir = tempfile::tempdir().unwrap();
        let service = Service::from_config(&BackendConfig::file_system(Codec::Yaml, dir.path()))
            .unwrap();

        assert_eq!(service.backend().backend_type(), BackendType::FileSystem);
        assert_eq!(service.backend().codec(), Codec::Yaml);
    }
}
