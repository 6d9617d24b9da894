//! Template compilation
//!
//! Resolves an instruction's declared templates and deep-merges them into
//! its source:
//!
//! ```text
//! T = {}
//! for t in templates:   T = merge(parent = t.source, child = T)
//! source = merge(parent = own source, child = T)
//! ```
//!
//! Scalar precedence: instruction > later template > earlier template.
//! Sequences accumulate in template order, then the instruction's own items.
//! Templates are resolved one level deep; a template's own metadata is not
//! consulted for further templates.

use crate::backend::{Backend, Namespace};
use crate::error::{BackendError, BackendResult};
use hydropump_model::{merge, Instruction, Source, Template};
use std::collections::{BTreeMap, HashMap};

/// Template resolution used by the compiler
///
/// Every [`Backend`] implements this through `get_template`. In-memory maps
/// implement it too, which keeps the algorithm testable without storage.
pub trait TemplateLookup {
    /// Resolve a template by id
    ///
    /// # Errors
    /// Returns `BackendError::NotFound` when the template does not exist
    fn lookup_template(&self, id: &str) -> BackendResult<Template>;
}

impl<B: Backend + ?Sized> TemplateLookup for B {
    fn lookup_template(&self, id: &str) -> BackendResult<Template> {
        self.get_template(id)
    }
}

impl TemplateLookup for HashMap<String, Template> {
    fn lookup_template(&self, id: &str) -> BackendResult<Template> {
        self.get(id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(Namespace::Template, id))
    }
}

impl TemplateLookup for BTreeMap<String, Template> {
    fn lookup_template(&self, id: &str) -> BackendResult<Template> {
        self.get(id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(Namespace::Template, id))
    }
}

/// Merge the sources of `template_ids`, in order, into one accumulated source
///
/// # Errors
/// Propagates the first lookup failure
pub fn resolve_templates<L>(lookup: &L, template_ids: &[String]) -> BackendResult<Source>
where
    L: TemplateLookup + ?Sized,
{
    let mut accumulated = Source::new();
    for template_id in template_ids {
        let template = lookup.lookup_template(template_id)?;
        accumulated = merge(&template.source, accumulated);
    }
    Ok(accumulated)
}

/// Compile `instruction` against the templates it declares
///
/// Returns the instruction with its merged source and `compiled` set. The
/// input is consumed; nothing is persisted.
///
/// # Errors
/// Propagates `NotFound` for any declared template that cannot be resolved.
/// The instruction is left uncompiled in that case.
pub fn compile_instruction<L>(
    lookup: &L,
    mut instruction: Instruction,
) -> BackendResult<Instruction>
where
    L: TemplateLookup + ?Sized,
{
    let inherited = resolve_templates(lookup, instruction.templates())?;
    let own = std::mem::take(&mut instruction.source);
    instruction.source = merge(&own, inherited);
    instruction.metadata.compiled = true;

    tracing::debug!(
        id = %instruction.id,
        templates = instruction.metadata.templates.len(),
        "compiled instruction"
    );
    Ok(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydropump_model::Metadata;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn source(value: Value) -> Source {
        serde_json::from_value(value).unwrap()
    }

    fn templates(entries: &[(&str, Value)]) -> HashMap<String, Template> {
        entries
            .iter()
            .map(|(id, src)| {
                (
                    (*id).to_string(),
                    Template::with_id(*id, Metadata::new(), source(src.clone())),
                )
            })
            .collect()
    }

    fn instruction(template_ids: &[&str], src: Value) -> Instruction {
        Instruction::with_id(
            "instr",
            Metadata::new().with_templates(template_ids.iter().copied()),
            source(src),
        )
    }

    #[test]
    fn instruction_scalar_wins() {
        let lookup = templates(&[("t", json!({"a": 2, "b": 3}))]);
        let compiled = compile_instruction(&lookup, instruction(&["t"], json!({"a": 1}))).unwrap();

        assert_eq!(Value::Object(compiled.source), json!({"a": 1, "b": 3}));
        assert!(compiled.metadata.compiled);
    }

    #[test]
    fn sequences_accumulate_in_declaration_order() {
        let lookup = templates(&[("t1", json!({"x": [1]})), ("t2", json!({"x": [2]}))]);
        let compiled =
            compile_instruction(&lookup, instruction(&["t1", "t2"], json!({"x": [3]}))).unwrap();

        assert_eq!(compiled.source["x"], json!([1, 2, 3]));
    }

    #[test]
    fn later_template_overrides_earlier_scalar() {
        let lookup = templates(&[
            ("t1", json!({"level": "debug", "only1": true})),
            ("t2", json!({"level": "warn"})),
        ]);
        let compiled = compile_instruction(&lookup, instruction(&["t1", "t2"], json!({}))).unwrap();

        assert_eq!(
            Value::Object(compiled.source),
            json!({"level": "warn", "only1": true})
        );
    }

    #[test]
    fn nested_mappings_merge_instead_of_replacing() {
        let lookup = templates(&[("conn", json!({"conn": {"host": "a", "port": 1}}))]);
        let compiled =
            compile_instruction(&lookup, instruction(&["conn"], json!({"conn": {"port": 2}})))
                .unwrap();

        assert_eq!(compiled.source["conn"], json!({"host": "a", "port": 2}));
    }

    #[test]
    fn no_templates_leaves_source_unchanged() {
        let lookup = HashMap::new();
        let original = instruction(&[], json!({"k": [1], "m": {"n": "v"}}));
        let compiled = compile_instruction(&lookup, original.clone()).unwrap();

        assert_eq!(compiled.source, original.source);
        assert!(compiled.is_compiled());
    }

    #[test]
    fn missing_template_is_not_found() {
        let lookup = templates(&[("present", json!({}))]);
        let err = compile_instruction(&lookup, instruction(&["present", "absent"], json!({})))
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn template_list_is_not_transitive() {
        let mut lookup = templates(&[("child", json!({"a": 1}))]);
        lookup.insert(
            "parent".to_string(),
            Template::with_id(
                "parent",
                Metadata::new().with_templates(["child"]),
                source(json!({"b": 2})),
            ),
        );
        let compiled = compile_instruction(&lookup, instruction(&["parent"], json!({}))).unwrap();

        assert_eq!(Value::Object(compiled.source), json!({"b": 2}));
    }

    #[test]
    fn btree_lookup_resolves() {
        let lookup: BTreeMap<String, Template> = templates(&[("t", json!({"z": 0}))])
            .into_iter()
            .collect();
        let merged = resolve_templates(&lookup, &["t".to_string()]).unwrap();
        assert_eq!(merged.get("z"), Some(&json!(0)));
    }
}
