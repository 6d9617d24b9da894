//! Instruction and template entities

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::envelope::{InstructionEnvelope, TemplateEnvelope};
use crate::merge::Source;

/// Generate a fresh entity identifier (UUID v4)
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Naive layouts accepted for stored timestamps, read as UTC
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let text = raw.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a stored timestamp, or park the raw value in `extra` under `key`
fn take_timestamp(
    raw: Option<Value>,
    key: &str,
    extra: &mut Map<String, Value>,
) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        extra.insert(key.to_string(), raw);
    }
    parsed
}

/// Metadata as found in stored documents
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMetadata {
    #[serde(default)]
    templates: Vec<String>,
    #[serde(default)]
    compiled: bool,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    modified_at: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<StoredMetadata> for Metadata {
    fn from(stored: StoredMetadata) -> Self {
        let mut extra = stored.extra;
        let created_at = take_timestamp(stored.created_at, "createdAt", &mut extra);
        let modified_at = take_timestamp(stored.modified_at, "modifiedAt", &mut extra);
        Self {
            templates: stored.templates,
            compiled: stored.compiled,
            created_at,
            modified_at,
            extra,
        }
    }
}

/// Entity metadata
///
/// Recognized keys are typed; anything else is carried through `extra`
/// untouched. Serialized with camelCase keys (`createdAt`, `modifiedAt`).
///
/// Timestamps are written as RFC 3339. On read, naive `YYYY-MM-DD HH:MM:SS[.ffffff]`
/// values are accepted as UTC; anything else stays verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMetadata")]
pub struct Metadata {
    /// Template ids applied during compilation, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<String>,

    /// Whether `source` holds a compiled result
    #[serde(default)]
    pub compiled: bool,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last modification timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// Unrecognized keys, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Create empty metadata
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With template ids, in declaration order
    #[must_use]
    pub fn with_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    /// With an additional free-form key
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Stamp `createdAt` with the current time
    pub fn stamp_created(&mut self) {
        self.extra.remove("createdAt");
        self.created_at = Some(Utc::now());
    }

    /// Stamp `modifiedAt` with the current time
    pub fn stamp_modified(&mut self) {
        self.extra.remove("modifiedAt");
        self.modified_at = Some(Utc::now());
    }
}

/// A stored configuration document that may inherit from templates
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Identifier within the base namespace
    pub id: String,
    /// Bookkeeping, including the template list
    pub metadata: Metadata,
    /// Configuration payload (raw, or compiled once `metadata.compiled` is set)
    pub source: Source,
}

impl Instruction {
    /// Create an uncompiled instruction, generating an id when none is given
    #[must_use]
    pub fn new(id: Option<String>, mut metadata: Metadata, source: Source) -> Self {
        metadata.compiled = false;
        Self {
            id: id.unwrap_or_else(generate_id),
            metadata,
            source,
        }
    }

    /// Create an uncompiled instruction with a known id
    #[inline]
    #[must_use]
    pub fn with_id(id: impl Into<String>, metadata: Metadata, source: Source) -> Self {
        Self::new(Some(id.into()), metadata, source)
    }

    /// Template ids declared by this instruction
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &[String] {
        &self.metadata.templates
    }

    /// Whether the template chain has been merged into `source`
    #[inline]
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.metadata.compiled
    }

    /// Replace the provided parts wholesale and stamp `modifiedAt`
    ///
    /// The result is raw again: `compiled` is cleared whatever the new
    /// metadata says.
    pub fn apply_update(&mut self, metadata: Option<Metadata>, source: Option<Source>) {
        if let Some(metadata) = metadata {
            self.metadata = metadata;
        }
        if let Some(source) = source {
            self.source = source;
        }
        self.metadata.compiled = false;
        self.metadata.stamp_modified();
    }

    /// Persisted shape of this instruction
    #[must_use]
    pub fn to_envelope(&self) -> InstructionEnvelope {
        InstructionEnvelope {
            metadata: self.metadata.clone(),
            instruction: self.source.clone(),
        }
    }

    /// Rebuild an instruction read back from storage
    #[must_use]
    pub fn from_envelope(id: impl Into<String>, envelope: InstructionEnvelope) -> Self {
        Self::with_id(id, envelope.metadata, envelope.instruction)
    }
}

/// A reusable configuration fragment referenced by instructions
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Identifier within the template namespace
    pub id: String,
    /// Bookkeeping; `compiled` is always false for templates
    pub metadata: Metadata,
    /// Fields inherited by instructions
    pub source: Source,
}

impl Template {
    /// Create a template, generating an id when none is given
    #[must_use]
    pub fn new(id: Option<String>, mut metadata: Metadata, source: Source) -> Self {
        metadata.compiled = false;
        Self {
            id: id.unwrap_or_else(generate_id),
            metadata,
            source,
        }
    }

    /// Create a template with a known id
    #[inline]
    #[must_use]
    pub fn with_id(id: impl Into<String>, metadata: Metadata, source: Source) -> Self {
        Self::new(Some(id.into()), metadata, source)
    }

    /// Replace the provided parts wholesale and stamp `modifiedAt`
    pub fn apply_update(&mut self, metadata: Option<Metadata>, source: Option<Source>) {
        if let Some(metadata) = metadata {
            self.metadata = metadata;
        }
        if let Some(source) = source {
            self.source = source;
        }
        self.metadata.compiled = false;
        self.metadata.stamp_modified();
    }

    /// Persisted shape of this template
    #[must_use]
    pub fn to_envelope(&self) -> TemplateEnvelope {
        TemplateEnvelope {
            metadata: self.metadata.clone(),
            template: self.source.clone(),
        }
    }

    /// Rebuild a template read back from storage
    #[must_use]
    pub fn from_envelope(id: impl Into<String>, envelope: TemplateEnvelope) -> Self {
        Self::with_id(id, envelope.metadata, envelope.template)
    }
}
