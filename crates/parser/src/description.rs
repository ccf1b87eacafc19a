//! Queries over a loaded description tree
//!
//! The description arrives as a generic YAML tree; these helpers read the
//! handful of shapes the translator cares about and tolerate absent keys.

use apigen_common::{GeneratorError, Result};
use serde_yaml::{Mapping, Value};

pub(crate) fn str_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

pub(crate) fn bool_field(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn mapping_field<'a>(node: &'a Value, key: &str) -> Option<&'a Mapping> {
    node.get(key).and_then(Value::as_mapping)
}

pub(crate) fn sequence_field<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key)
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Strings of a sequence field; `None` if the key is absent
pub(crate) fn string_list(node: &Value, key: &str) -> Option<Vec<String>> {
    node.get(key).and_then(Value::as_sequence).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// The target of a `$ref`, if the node is a reference
pub(crate) fn ref_target(node: &Value) -> Option<&str> {
    str_field(node, "$ref")
}

/// Mapping keys as strings; YAML allows unquoted numeric keys such as `200`
pub(crate) fn key_string(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(GeneratorError::Parse(format!(
            "Unsupported mapping key: {:?}",
            other
        ))),
    }
}

/// Render a `default` value the way it should appear in generated code
pub(crate) fn default_value(node: &Value) -> Option<String> {
    match node.get("default")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Resolve a local JSON pointer such as `#/definitions/Event`
pub(crate) fn resolve_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let path = pointer.strip_prefix('#')?;
    if path.is_empty() {
        return Some(root);
    }
    path.strip_prefix('/')?
        .split('/')
        .try_fold(root, |node, token| {
            let token = token.replace("~1", "/").replace("~0", "~");
            match node {
                Value::Sequence(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => node.get(token.as_str()),
            }
        })
}

/// Last token of a JSON pointer, unescaped
pub(crate) fn pointer_name(pointer: &str) -> String {
    let token = pointer.rsplit('/').next().unwrap_or(pointer);
    token.replace("~1", "/").replace("~0", "~")
}

/// Escape a name for use as a JSON pointer token
pub(crate) fn pointer_escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
