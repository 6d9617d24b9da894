//! Filesystem backend
//!
//! One file per entity:
//!
//! ```text
//! {root}/base/{id}.{ext}        instructions
//! {root}/template/{id}.{ext}    templates
//! ```
//!
//! Writes go to a temporary file in the same directory and are renamed over
//! the target, so readers never observe a missing or half-written document.

use crate::backend::{validate_id, Backend, BackendType, Namespace};
use crate::codec::Codec;
use crate::error::{BackendError, BackendResult};
use hydropump_model::{Instruction, InstructionEnvelope, Template, TemplateEnvelope};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Backend storing entities as files under a root directory
#[derive(Debug, Clone)]
pub struct FileSystemBackend {
    /// Existing directory holding the namespace subdirectories
    root: PathBuf,
    /// Document format and extension
    codec: Codec,
}

impl FileSystemBackend {
    /// Open a backend rooted at an existing directory
    ///
    /// Creates the `base/` and `template/` subdirectories when missing.
    ///
    /// # Errors
    /// - `BackendError::Configuration` if `root_directory` is not an existing directory
    /// - `BackendError::Io` if the namespace directories cannot be created
    pub fn new(codec: Codec, root_directory: impl Into<PathBuf>) -> BackendResult<Self> {
        let root = root_directory.into();
        if !root.is_dir() {
            return Err(BackendError::Configuration(format!(
                "root directory must exist for FileSystemBackend to initialize: {}",
                root.display()
            )));
        }

        let backend = Self { root, codec };
        backend.ensure_layout()?;
        tracing::info!(root = %backend.root.display(), codec = %codec, "opened filesystem backend");
        Ok(backend)
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one namespace
    #[inline]
    #[must_use]
    pub fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    /// File backing an entity: `{root}/{namespace}/{id}.{ext}`
    #[must_use]
    pub fn entity_path(&self, namespace: Namespace, id: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{id}.{}", self.codec.extension()))
    }

    /// Ensure both namespace directories exist
    ///
    /// # Errors
    /// Returns `BackendError::Io` if a directory cannot be created
    pub fn ensure_layout(&self) -> BackendResult<()> {
        for namespace in Namespace::ALL {
            let dir = self.namespace_dir(namespace);
            fs::create_dir_all(&dir).map_err(|e| BackendError::io_error(&dir, e))?;
        }
        Ok(())
    }

    fn read_document<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        id: &str,
    ) -> BackendResult<T> {
        validate_id(namespace, id)?;
        let path = self.entity_path(namespace, id);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(%namespace, id, "entity not found");
                return Err(BackendError::not_found(namespace, id));
            }
            Err(e) => return Err(BackendError::io_error(path, e)),
        };

        tracing::debug!(%namespace, id, bytes = content.len(), "read entity");
        self.codec.decode(&content, &path)
    }

    fn write_document<T: Serialize>(
        &self,
        namespace: Namespace,
        id: &str,
        document: &T,
    ) -> BackendResult<()> {
        validate_id(namespace, id)?;
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir).map_err(|e| BackendError::io_error(&dir, e))?;

        let path = self.entity_path(namespace, id);
        let content = self.codec.encode(document, &path)?;

        let mut staged = NamedTempFile::new_in(&dir).map_err(|e| BackendError::io_error(&dir, e))?;
        staged
            .write_all(content.as_bytes())
            .map_err(|e| BackendError::io_error(staged.path(), e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| BackendError::io_error(staged.path(), e))?;
        staged
            .persist(&path)
            .map_err(|e| BackendError::io_error(&path, e.error))?;

        tracing::info!(%namespace, id, path = %path.display(), "wrote entity");
        Ok(())
    }

    fn remove_document(&self, namespace: Namespace, id: &str) -> BackendResult<()> {
        validate_id(namespace, id)?;
        let path = self.entity_path(namespace, id);

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(%namespace, id, "deleted entity");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(%namespace, id, "delete of absent entity");
                Ok(())
            }
            Err(e) => Err(BackendError::io_error(path, e)),
        }
    }
}

impl Backend for FileSystemBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::FileSystem
    }

    fn codec(&self) -> Codec {
        self.codec
    }

    fn get_base(&self, id: &str) -> BackendResult<Instruction> {
        let envelope: InstructionEnvelope = self.read_document(Namespace::Base, id)?;
        Ok(Instruction::from_envelope(id, envelope))
    }

    fn put_base(&self, instruction: Instruction) -> BackendResult<Instruction> {
        self.write_document(Namespace::Base, &instruction.id, &instruction.to_envelope())?;
        Ok(instruction)
    }

    fn delete_base(&self, id: &str) -> BackendResult<()> {
        self.remove_document(Namespace::Base, id)
    }

    fn get_template(&self, id: &str) -> BackendResult<Template> {
        let envelope: TemplateEnvelope = self.read_document(Namespace::Template, id)?;
        Ok(Template::from_envelope(id, envelope))
    }

    fn put_template(&self, template: Template) -> BackendResult<Template> {
        self.write_document(Namespace::Template, &template.id, &template.to_envelope())?;
        Ok(template)
    }

    fn delete_template(&self, id: &str) -> BackendResult<()> {
        self.remove_document(Namespace::Template, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydropump_model::{Metadata, Source};
    use serde_json::json;

    fn backend(codec: Codec) -> (tempfile::TempDir, FileSystemBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileSystemBackend::new(codec, dir.path()).unwrap();
        (dir, backend)
    }

    #[test]
    fn creates_namespace_directories() {
        let (dir, _backend) = backend(Codec::Json);
        assert!(dir.path().join("base").is_dir());
        assert!(dir.path().join("template").is_dir());
    }

    #[test]
    fn missing_root_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = FileSystemBackend::new(Codec::Json, &missing).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn root_that_is_a_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let err = FileSystemBackend::new(Codec::Yaml, &file).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn entity_path_layout() {
        let (dir, backend) = backend(Codec::Yaml);
        assert_eq!(
            backend.entity_path(Namespace::Template, "net"),
            dir.path().join("template").join("net.yaml")
        );
        assert_eq!(
            backend.entity_path(Namespace::Base, "job"),
            dir.path().join("base").join("job.yaml")
        );
    }

    #[test]
    fn put_replaces_previous_document() {
        let (dir, backend) = backend(Codec::Json);
        let first: Source = serde_json::from_value(json!({"v": 1, "old": true})).unwrap();
        let second: Source = serde_json::from_value(json!({"v": 2})).unwrap();

        backend
            .put_base(Instruction::with_id("job", Metadata::new(), first))
            .unwrap();
        backend
            .put_base(Instruction::with_id("job", Metadata::new(), second.clone()))
            .unwrap();

        assert_eq!(backend.get_base("job").unwrap().source, second);
        let entries: Vec<_> = fs::read_dir(dir.path().join("base")).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary files must not linger");
    }

    #[test]
    fn namespaces_do_not_collide() {
        let (_dir, backend) = backend(Codec::Json);
        backend
            .put_template(Template::with_id("shared", Metadata::new(), Source::new()))
            .unwrap();

        assert!(backend.get_base("shared").unwrap_err().is_not_found());
        assert!(backend.get_template("shared").is_ok());
    }

    #[test]
    fn invalid_ids_rejected_before_io() {
        let (_dir, backend) = backend(Codec::Json);
        assert!(backend.get_base("").unwrap_err().is_invalid_argument());
        assert!(backend.delete_template("../x").unwrap_err().is_invalid_argument());
        let err = backend
            .put_base(Instruction::with_id("a/b", Metadata::new(), Source::new()))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn corrupt_document_is_decode_error() {
        let (dir, backend) = backend(Codec::Json);
        fs::write(dir.path().join("base").join("bad.json"), "{ nope").unwrap();
        let err = backend.get_base("bad").unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }
}
