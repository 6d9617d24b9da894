//! Persisted document shapes
//!
//! Storage backends write these envelopes rather than the entities
//! themselves. Missing keys decode to empty values so hand-written documents
//! only need the parts they use.

use serde::{Deserialize, Serialize};

use crate::entity::Metadata;
use crate::merge::Source;

/// On-disk form of an instruction: `{"metadata": ..., "instruction": ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionEnvelope {
    /// Instruction metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Instruction source
    #[serde(default)]
    pub instruction: Source,
}

/// On-disk form of a template: `{"metadata": ..., "template": ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateEnvelope {
    /// Template metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Template source
    #[serde(default)]
    pub template: Source,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instruction, Template};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn instruction_envelope_shape() {
        let mut source = Source::new();
        source.insert("system".into(), json!("darwin"));
        let instruction = Instruction::with_id(
            "i-1",
            crate::Metadata::new().with_templates(["t-1"]),
            source,
        );

        let value = serde_json::to_value(instruction.to_envelope()).unwrap();
        assert_eq!(
            value,
            json!({
                "metadata": {"templates": ["t-1"], "compiled": false},
                "instruction": {"system": "darwin"}
            })
        );
    }

    #[test]
    fn template_envelope_shape() {
        let template = Template::with_id("t-1", crate::Metadata::new(), Source::new());
        let value = serde_json::to_value(template.to_envelope()).unwrap();
        assert_eq!(value, json!({"metadata": {"compiled": false}, "template": {}}));
    }

    #[test]
    fn missing_keys_decode_empty() {
        let envelope: InstructionEnvelope = serde_json::from_value(json!({})).unwrap();
        assert_eq!(envelope, InstructionEnvelope::default());

        let envelope: TemplateEnvelope =
            serde_json::from_value(json!({"template": {"a": 1}})).unwrap();
        assert_eq!(envelope.template.get("a"), Some(&json!(1)));
    }

    #[test]
    fn from_envelope_resets_compiled_flag() {
        let envelope: InstructionEnvelope = serde_json::from_value(json!({
            "metadata": {"compiled": true},
            "instruction": {"k": "v"}
        }))
        .unwrap();

        let instruction = Instruction::from_envelope("i-2", envelope);
        assert_eq!(instruction.id, "i-2");
        assert!(!instruction.is_compiled());
        assert_eq!(instruction.source.get("k"), Some(&json!("v")));
    }
}
