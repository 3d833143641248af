//! Projection of a value tree back into plain nested mappings.
//!
//! Every field is emitted in declaration order, including fields still at their
//! default, so that writing a projection and reading it back reproduces the same
//! tree. Absent values project as null.

use serde_json::{Map, Value};

use crate::field::Field;
use crate::node::{Node, StructNode};
use crate::overrides::join;
use crate::types::Scalar;

pub(crate) fn project(node: &StructNode) -> Value {
    let mut map = Map::new();
    for (field, child) in node.entries() {
        map.insert(field.name().to_string(), project_field(field, child));
    }
    Value::Object(map)
}

pub(crate) fn project_field(field: &Field, node: &Node) -> Value {
    match node {
        // An optional struct nobody assigned into is absent as a whole.
        Node::Struct(inner) if field.is_optional() && !inner.touched => Value::Null,
        other => project_node(other),
    }
}

pub(crate) fn project_node(node: &Node) -> Value {
    match node {
        Node::Scalar(Some(s)) => s.to_value(),
        Node::Array(Some(items)) => Value::Array(items.iter().map(Scalar::to_value).collect()),
        Node::Scalar(None) | Node::Array(None) => Value::Null,
        Node::Struct(inner) => project(inner),
    }
}

/// Flatten into dotted `(key, display value)` pairs, leaves only.
pub(crate) fn flatten(node: &StructNode) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(node, "", &mut out);
    out
}

fn flatten_into(node: &StructNode, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, child) in node.entries() {
        let key = join(prefix, field.name());
        match child {
            Node::Struct(inner) => flatten_into(inner, &key, out),
            leaf => out.push((key, format_value(&project_node(leaf)))),
        }
    }
}

/// Format a value for display.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
