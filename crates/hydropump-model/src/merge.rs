//! Deep-merge primitive used by template compilation
//!
//! Scalars override, sequences accumulate, mappings merge recursively.

use serde_json::{Map, Value};

/// Nested configuration payload of an instruction or template
pub type Source = Map<String, Value>;

/// Merge `parent` over `child`, returning the combined mapping.
///
/// For every key present in `parent`:
/// - scalar (string, number, boolean): the parent value replaces the child's
/// - sequence: child's sequence (or empty) followed by the parent's elements
/// - mapping: merged recursively, parent over child
///
/// Keys only present in `child` are left untouched. A `null` in `parent`
/// leaves the child's value in place. When the child holds a value of a
/// different kind than the parent's sequence or mapping, it is treated as
/// empty.
///
/// # Examples
/// ```
/// # use hydropump_model::{merge, Source};
/// # use serde_json::json;
/// let parent: Source = serde_json::from_value(json!({"x": [2], "a": 1})).unwrap();
/// let child: Source = serde_json::from_value(json!({"x": [1], "b": 2})).unwrap();
/// let merged = merge(&parent, child);
/// assert_eq!(serde_json::Value::Object(merged), json!({"x": [1, 2], "a": 1, "b": 2}));
/// ```
#[must_use]
pub fn merge(parent: &Source, child: Source) -> Source {
    let mut output = child;

    for (key, parent_value) in parent {
        match parent_value {
            Value::Null => {}
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                output.insert(key.clone(), parent_value.clone());
            }
            Value::Array(items) => {
                let slot = output
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                if let Value::Array(existing) = slot {
                    existing.extend(items.iter().cloned());
                }
            }
            Value::Object(submap) => {
                let slot = output
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                let nested_child = match std::mem::take(slot) {
                    Value::Object(existing) => existing,
                    _ => Map::new(),
                };
                *slot = Value::Object(merge(submap, nested_child));
            }
        }
    }

    output
}
