//! Testing utilities for Hydropump workspace
//!
//! Shared fixtures and a throwaway filesystem store.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use hydropump_backend::{Backend, Codec, FileSystemBackend};
use hydropump_model::{Instruction, Metadata, Source, Template};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Build a source mapping from a JSON object literal
pub fn source_from(value: Value) -> Source {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture source must be a JSON object, got {other}"),
    }
}

pub fn example_source() -> Source {
    source_from(json!({
        "system": "darwin",
        "zone": "us-east1-a",
    }))
}

pub fn example_metadata() -> Metadata {
    Metadata::new().with_extra("owner", "platform-team")
}

pub fn metadata_with_templates(templates: &[&str]) -> Metadata {
    Metadata::new().with_templates(templates.iter().copied())
}

pub fn create_test_instruction(id: &str, templates: &[&str], source: Value) -> Instruction {
    Instruction::with_id(id, metadata_with_templates(templates), source_from(source))
}

pub fn create_test_template(id: &str, source: Value) -> Template {
    Template::with_id(id, Metadata::new(), source_from(source))
}

/// Filesystem backend rooted in a temporary directory
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct TestStore {
    dir: TempDir,
    backend: FileSystemBackend,
}

impl TestStore {
    pub fn new(codec: Codec) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let backend = FileSystemBackend::new(codec, dir.path()).expect("open filesystem backend");
        Self { dir, backend }
    }

    pub fn json() -> Self {
        Self::new(Codec::Json)
    }

    pub fn yaml() -> Self {
        Self::new(Codec::Yaml)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn backend(&self) -> &FileSystemBackend {
        &self.backend
    }

    /// Store templates by id, panicking on failure
    pub fn seed_templates(&self, templates: &[(&str, Value)]) {
        for (id, source) in templates {
            self.backend
                .put_template(create_test_template(id, source.clone()))
                .expect("seed template");
        }
    }
}
