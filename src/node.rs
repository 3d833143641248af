//! Value nodes: the live, mutable tree bound to a schema.
//!
//! A [`StructNode`] holds exactly one child [`Node`] per field of its schema, in
//! declaration order, so the descriptor for `children[i]` is
//! `schema.fields()[i]`. Nodes never own descriptors; they reach them through
//! the shared schema.
//!
//! The tree is meant for a single owner. Sharing one across threads needs
//! external synchronization.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;
use crate::field::{DefaultValue, Field, Kind};
use crate::merge::{self, MergeOptions};
use crate::schema::Schema;
use crate::types::{self, Scalar};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    /// `None` is the absent marker.
    Scalar(Option<Scalar>),
    Array(Option<Vec<Scalar>>),
    Struct(StructNode),
}

#[derive(Debug, Clone)]
pub(crate) struct StructNode {
    schema: Arc<Schema>,
    children: Vec<Node>,
    /// Set once a mapping has been assigned into this node. Untouched optional
    /// structs are exempt from the required-field pass.
    pub(crate) touched: bool,
}

impl PartialEq for StructNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
            && self.touched == other.touched
            && self.children == other.children
    }
}

impl Node {
    /// Initial node for a field: its default, the absent marker, or a fresh
    /// default-initialized struct.
    pub(crate) fn from_field(field: &Field) -> Node {
        match field.kind() {
            Kind::Scalar(_) => Node::Scalar(match field.default() {
                Some(DefaultValue::Scalar(s)) => Some(s.clone()),
                _ => None,
            }),
            Kind::Array(_) => Node::Array(match field.default() {
                Some(DefaultValue::Array(items)) => Some(items.clone()),
                _ => None,
            }),
            Kind::Struct(schema) => Node::Struct(StructNode::new(schema)),
        }
    }

    pub(crate) fn is_absent(&self) -> bool {
        matches!(self, Node::Scalar(None) | Node::Array(None))
    }

    /// Coerce `raw` against `field` and store it.
    ///
    /// Scalars and arrays are replaced wholesale, and only once every element has
    /// coerced, so a failure leaves the previous value in place. Mappings are
    /// overlaid onto struct nodes through the merge engine.
    pub(crate) fn assign(
        &mut self,
        field: &Field,
        raw: &Value,
        path: &str,
        options: MergeOptions,
    ) -> Result<(), ConfigError> {
        if raw.is_null() {
            return self.reset(field, path);
        }

        match field.kind() {
            Kind::Scalar(ty) => {
                let scalar = types::coerce(*ty, raw).ok_or_else(|| mismatch(path, field.kind(), raw))?;
                *self = Node::Scalar(Some(scalar));
            }
            Kind::Array(ty) => {
                let Value::Array(items) = raw else {
                    return Err(mismatch(path, field.kind(), raw));
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let scalar = types::coerce(*ty, item).ok_or_else(|| ConfigError::TypeMismatch {
                        path: format!("{path}[{i}]"),
                        expected: ty.name().to_string(),
                        received: types::describe_received(item),
                    })?;
                    out.push(scalar);
                }
                *self = Node::Array(Some(out));
            }
            Kind::Struct(schema) => {
                let Value::Object(source) = raw else {
                    return Err(mismatch(path, field.kind(), raw));
                };
                if let Node::Struct(inner) = self {
                    merge::overlay(inner, source, path, options)?;
                } else {
                    let mut inner = StructNode::new(schema);
                    merge::overlay(&mut inner, source, path, options)?;
                    *self = Node::Struct(inner);
                }
            }
        }
        Ok(())
    }

    /// Null assignment: back to the default, or to absent when optional.
    fn reset(&mut self, field: &Field, path: &str) -> Result<(), ConfigError> {
        if field.is_required() {
            return Err(ConfigError::MissingRequiredField(path.to_string()));
        }
        *self = Node::from_field(field);
        Ok(())
    }
}

fn mismatch(path: &str, kind: &Kind, raw: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        path: path.to_string(),
        expected: kind.to_string(),
        received: types::describe_received(raw),
    }
}

impl StructNode {
    pub(crate) fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            children: schema.fields().iter().map(Node::from_field).collect(),
            touched: false,
        }
    }

    pub(crate) fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// `(descriptor, node)` pairs in declaration order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Field, &Node)> {
        self.schema.fields().iter().zip(self.children.iter())
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<(&Field, &mut Node)> {
        let idx = self.schema.position(name)?;
        let field = self.schema.fields().get(idx)?;
        let node = self.children.get_mut(idx)?;
        Some((field, node))
    }

    /// Resolve a dotted path to its descriptor and node.
    pub(crate) fn lookup(&self, path: &str) -> Option<(&Field, &Node)> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let idx = self.schema.position(first)?;
        let mut found = (self.schema.fields().get(idx)?, self.children.get(idx)?);
        for segment in segments {
            let Node::Struct(inner) = found.1 else {
                return None;
            };
            let idx = inner.schema.position(segment)?;
            found = (inner.schema.fields().get(idx)?, inner.children.get(idx)?);
        }
        Some(found)
    }

    pub(crate) fn lookup_mut(&mut self, path: &str) -> Option<(&Field, &mut Node)> {
        match path.split_once('.') {
            None => self.child_mut(path),
            Some((head, rest)) => match self.child_mut(head)? {
                (_, Node::Struct(inner)) => inner.lookup_mut(rest),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::training_schema;
    use crate::types::ValueType;
    use serde_json::json;

    fn field(spec: crate::field::FieldSpec) -> Field {
        spec.build().unwrap()
    }

    #[test]
    fn struct_node_has_one_child_per_field() {
        let schema = training_schema();
        let node = StructNode::new(&schema);
        assert_eq!(node.entries().count(), schema.fields().len());
        assert!(!node.touched);
    }

    #[test]
    fn seeded_from_defaults() {
        let schema = training_schema();
        let node = StructNode::new(&schema);
        let (_, lr) = node.lookup("learning_rate").unwrap();
        assert_eq!(lr, &Node::Scalar(Some(Scalar::Float(0.001))));
        let (_, epochs) = node.lookup("epochs").unwrap();
        assert!(epochs.is_absent());
        let (_, batch) = node.lookup("training_dataset.batch_size").unwrap();
        assert_eq!(batch, &Node::Scalar(Some(Scalar::Int(64))));
    }

    #[test]
    fn failed_scalar_assign_keeps_previous_value() {
        let f = field(crate::Field::int("n").default(5));
        let mut node = Node::from_field(&f);
        let err = node
            .assign(&f, &json!("x"), "n", MergeOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert_eq!(node, Node::Scalar(Some(Scalar::Int(5))));
    }

    #[test]
    fn array_assign_is_all_or_nothing() {
        let f = field(crate::Field::array("xs", ValueType::Int).default(vec![1]));
        let mut node = Node::from_field(&f);
        let err = node
            .assign(&f, &json!([2, 3, "four", "five"]), "xs", MergeOptions::default())
            .unwrap_err();
        match err {
            ConfigError::TypeMismatch { path, expected, .. } => {
                assert_eq!(path, "xs[2]");
                assert_eq!(expected, "int");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
        assert_eq!(node, Node::Array(Some(vec![Scalar::Int(1)])));
    }

    #[test]
    fn array_requires_sequence() {
        let f = field(crate::Field::array("xs", ValueType::String));
        let mut node = Node::from_field(&f);
        let err = node
            .assign(&f, &json!("a"), "xs", MergeOptions::default())
            .unwrap_err();
        match err {
            ConfigError::TypeMismatch { expected, .. } => assert_eq!(expected, "array<string>"),
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn null_resets_to_default() {
        let f = field(crate::Field::int("n").default(5));
        let mut node = Node::Scalar(Some(Scalar::Int(9)));
        node.assign(&f, &Value::Null, "n", MergeOptions::default())
            .unwrap();
        assert_eq!(node, Node::Scalar(Some(Scalar::Int(5))));
    }

    #[test]
    fn null_clears_optional() {
        let f = field(crate::Field::int("n").optional());
        let mut node = Node::Scalar(Some(Scalar::Int(9)));
        node.assign(&f, &Value::Null, "n", MergeOptions::default())
            .unwrap();
        assert!(node.is_absent());
    }

    #[test]
    fn null_on_required_fails() {
        let f = field(crate::Field::int("n"));
        let mut node = Node::Scalar(Some(Scalar::Int(9)));
        let err = node
            .assign(&f, &Value::Null, "a.n", MergeOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField(p) if p == "a.n"));
        assert_eq!(node, Node::Scalar(Some(Scalar::Int(9))));
    }

    #[test]
    fn lookup_through_leaf_fails() {
        let schema = training_schema();
        let node = StructNode::new(&schema);
        assert!(node.lookup("learning_rate.x").is_none());
        assert!(node.lookup("nope").is_none());
        assert!(node.lookup("").is_none());
    }

    #[test]
    fn lookup_mut_reaches_nested() {
        let schema = training_schema();
        let mut node = StructNode::new(&schema);
        let (field, child) = node.lookup_mut("training_dataset.batch_size").unwrap();
        child
            .assign(field, &json!(8), "training_dataset.batch_size", MergeOptions::default())
            .unwrap();
        let (_, batch) = node.lookup("training_dataset.batch_size").unwrap();
        assert_eq!(batch, &Node::Scalar(Some(Scalar::Int(8))));
    }
}
