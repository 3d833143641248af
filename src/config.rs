//! The live configuration instance.
//!
//! A [`Config`] is one value tree bound to a shared [`Schema`]. Every mutation
//! goes through the merge engine, so values are always coerced to their
//! declared types. Operations that can fail work on a copy of the tree and only
//! commit on success: an error leaves the config exactly as it was.
//!
//! ```ignore
//! let mut config = schema.instantiate();
//! config.read_file("train.yaml")?;
//! config.set("training_dataset.batch_size", 32)?;
//! let lr = config.float("learning_rate")?;
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;
use crate::field::{Field, Kind};
use crate::file;
use crate::format::Format;
use crate::merge::{self, MergeOptions};
use crate::node::{Node, StructNode};
use crate::overrides::nest;
use crate::project;
use crate::schema::Schema;
use crate::types::{self, Scalar, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: StructNode,
    options: MergeOptions,
}

impl Config {
    /// A fresh instance with every field at its default (or absent).
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self {
            root: StructNode::new(schema),
            options: MergeOptions::default(),
        }
    }

    /// Enable or disable strict mode (default: `true`). When strict, unknown
    /// keys are an error. When lenient, they are skipped and logged.
    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.root.schema()
    }

    pub fn options(&self) -> MergeOptions {
        self.options
    }

    /// The descriptor for a dotted path.
    pub fn field(&self, path: &str) -> Option<&Field> {
        self.root.lookup(path).map(|(field, _)| field)
    }

    /// Read a value by dotted path. Structs come back as nested mappings,
    /// absent values as null. The empty path returns the whole tree.
    pub fn get(&self, path: &str) -> Result<Value, ConfigError> {
        if path.is_empty() {
            return Ok(self.to_value());
        }
        let (field, node) = self
            .root
            .lookup(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))?;
        Ok(project::project_field(field, node))
    }

    /// Assign a value at a dotted path.
    ///
    /// A mapping assigned to a struct field is a partial overlay. Null resets the
    /// field (see [`unset`](Self::unset)). Required fields are checked for the
    /// assigned subtree only; the empty path behaves like [`merge`](Self::merge).
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let value = value.into();
        if path.is_empty() {
            return self.merge(&value);
        }
        let mut next = self.root.clone();
        merge::overlay(&mut next, &nest(path, value), "", self.options)?;
        merge::check_required_at(&next, path)?;
        self.root = next;
        Ok(())
    }

    /// Overlay a mapping and check required fields across the whole tree.
    pub fn merge(&mut self, source: &Value) -> Result<(), ConfigError> {
        let source = self.expect_mapping(source)?;
        self.merge_map(source)
    }

    pub(crate) fn merge_map(&mut self, source: &Map<String, Value>) -> Result<(), ConfigError> {
        let mut next = self.root.clone();
        merge::overlay(&mut next, source, "", self.options)?;
        merge::check_required(&next, "")?;
        self.root = next;
        Ok(())
    }

    /// Overlay a mapping without the required-field pass.
    ///
    /// Use this to stack several layers, then call [`validate`](Self::validate)
    /// once at the end.
    pub fn overlay(&mut self, source: &Value) -> Result<(), ConfigError> {
        let source = self.expect_mapping(source)?;
        self.overlay_map(source)
    }

    pub(crate) fn overlay_map(&mut self, source: &Map<String, Value>) -> Result<(), ConfigError> {
        let mut next = self.root.clone();
        merge::overlay(&mut next, source, "", self.options)?;
        self.root = next;
        Ok(())
    }

    /// Fail with `MissingRequiredField` if any required field is still unset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        merge::check_required(&self.root, "")
    }

    /// Reset a field to its default, or to absent if it is optional.
    ///
    /// Unsetting a required field without a default is an error.
    pub fn unset(&mut self, path: &str) -> Result<(), ConfigError> {
        let options = self.options;
        let (field, node) = self
            .root
            .lookup_mut(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))?;
        node.assign(field, &Value::Null, path, options)
    }

    /// Append one element to an array field. An absent array starts empty.
    pub fn push(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let value = value.into();
        let (field, node) = self
            .root
            .lookup_mut(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))?;
        let (Kind::Array(ty), Node::Array(items)) = (field.kind(), node) else {
            return Err(not_an_array(path, field));
        };
        let scalar = types::coerce(*ty, &value).ok_or_else(|| ConfigError::TypeMismatch {
            path: format!("{path}[{}]", items.as_ref().map_or(0, Vec::len)),
            expected: ty.name().to_string(),
            received: types::describe_received(&value),
        })?;
        items.get_or_insert_with(Vec::new).push(scalar);
        Ok(())
    }

    /// Remove and return the last element of an array field.
    pub fn pop(&mut self, path: &str) -> Result<Option<Value>, ConfigError> {
        let (field, node) = self
            .root
            .lookup_mut(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))?;
        match node {
            Node::Array(items) => Ok(items
                .as_mut()
                .and_then(Vec::pop)
                .map(|s| s.to_value())),
            _ => Err(not_an_array(path, field)),
        }
    }

    pub fn int(&self, path: &str) -> Result<Option<i64>, ConfigError> {
        Ok(self.scalar(path, ValueType::Int)?.and_then(Scalar::as_int))
    }

    pub fn float(&self, path: &str) -> Result<Option<f64>, ConfigError> {
        Ok(self.scalar(path, ValueType::Float)?.and_then(Scalar::as_float))
    }

    pub fn bool(&self, path: &str) -> Result<Option<bool>, ConfigError> {
        Ok(self.scalar(path, ValueType::Bool)?.and_then(Scalar::as_bool))
    }

    pub fn string(&self, path: &str) -> Result<Option<&str>, ConfigError> {
        Ok(self.scalar(path, ValueType::String)?.and_then(Scalar::as_str))
    }

    /// Elements of an array field, whatever their element type.
    pub fn array(&self, path: &str) -> Result<Option<&[Scalar]>, ConfigError> {
        let (field, node) = self
            .root
            .lookup(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))?;
        match node {
            Node::Array(items) => Ok(items.as_deref()),
            _ => Err(not_an_array(path, field)),
        }
    }

    fn scalar(&self, path: &str, ty: ValueType) -> Result<Option<&Scalar>, ConfigError> {
        let (field, node) = self
            .root
            .lookup(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))?;
        match (field.kind(), node) {
            (Kind::Scalar(declared), Node::Scalar(value)) if *declared == ty => Ok(value.as_ref()),
            (kind, _) => Err(ConfigError::TypeMismatch {
                path: path.to_string(),
                expected: ty.name().to_string(),
                received: format!("field of type {kind}"),
            }),
        }
    }

    /// The whole tree as a nested mapping, in declaration order.
    pub fn to_value(&self) -> Value {
        project::project(&self.root)
    }

    /// Every leaf as a dotted key and a display string (`<not set>` when absent).
    pub fn entries(&self) -> Vec<(String, String)> {
        project::flatten(&self.root)
    }

    /// Deserialize the current values into an application type.
    ///
    /// Fields of the tree the target type does not consume are logged.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let mut unused = Vec::new();
        let out = serde_ignored::deserialize(self.to_value(), |path| {
            unused.push(path.to_string());
        })
        .map_err(|e| ConfigError::Extract(e.to_string()))?;
        for path in &unused {
            debug!(event = "structfig.config.extract_unused_field", path = %path);
        }
        Ok(out)
    }

    /// Serialize the tree in the given format.
    pub fn render(&self, format: Format) -> Result<String, ConfigError> {
        format
            .serialize(&self.to_value())
            .map_err(ConfigError::Render)
    }

    /// Load a file and merge it in, then check required fields.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let source = file::load(path.as_ref())?;
        self.merge_map(&source)
    }

    /// Write the full tree to a file, creating parent directories.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        file::store(path.as_ref(), &self.to_value())
    }

    fn expect_mapping<'a>(&self, source: &'a Value) -> Result<&'a Map<String, Value>, ConfigError> {
        source.as_object().ok_or_else(|| ConfigError::TypeMismatch {
            path: "<root>".to_string(),
            expected: format!("struct {}", self.schema().name()),
            received: types::describe_received(source),
        })
    }
}

fn not_an_array(path: &str, field: &Field) -> ConfigError {
    ConfigError::TypeMismatch {
        path: path.to_string(),
        expected: "array".to_string(),
        received: format!("field of type {}", field.kind()),
    }
}

/// YAML rendering of the current values.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_yaml::to_string(&self.to_value()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
