//! Field descriptors: the static, immutable description of one schema slot.
//!
//! A [`FieldSpec`] is the declaration-time builder; [`FieldSpec::build`] (called
//! by [`SchemaBuilder::build`](crate::SchemaBuilder::build)) validates it into a
//! [`Field`]. Defaults are coerced at that point, so a bad default fails when the
//! schema is declared rather than when a config is loaded.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::Schema;
use crate::types::{self, Scalar, ValueType};

/// Shape of a field.
#[derive(Debug, Clone)]
pub enum Kind {
    Scalar(ValueType),
    Array(ValueType),
    Struct(Arc<Schema>),
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar(ty) => write!(f, "{ty}"),
            Kind::Array(ty) => write!(f, "array<{ty}>"),
            Kind::Struct(schema) => write!(f, "struct {}", schema.name()),
        }
    }
}

/// A validated default value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl DefaultValue {
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Scalar(s) => s.to_value(),
            DefaultValue::Array(items) => Value::Array(items.iter().map(Scalar::to_value).collect()),
        }
    }
}

/// An immutable field descriptor, shared by every instance of its schema.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: Kind,
    description: Option<String>,
    default: Option<DefaultValue>,
    optional: bool,
}

impl Field {
    /// Construct and validate a descriptor.
    ///
    /// Fails if the name is empty or contains `.` (it would be ambiguous in dotted
    /// paths), if a struct field is given a default, or if the default does not
    /// coerce to the field's type. A field may be both optional and defaulted:
    /// the default wins, and optionality only governs what an explicit null does.
    pub fn describe(
        name: &str,
        kind: Kind,
        description: Option<String>,
        default: Option<Value>,
        optional: bool,
    ) -> Result<Field, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::Schema("field names must not be empty".into()));
        }
        if name.contains('.') {
            return Err(ConfigError::Schema(format!(
                "field name '{name}' must not contain '.'"
            )));
        }

        let default = match (&kind, default) {
            (_, None) => None,
            (Kind::Struct(schema), Some(_)) => {
                return Err(ConfigError::Schema(format!(
                    "struct field '{name}' ({}) cannot carry a default",
                    schema.name()
                )));
            }
            (_, Some(Value::Null)) => None,
            (Kind::Scalar(ty), Some(raw)) => match types::coerce(*ty, &raw) {
                Some(s) => Some(DefaultValue::Scalar(s)),
                None => return Err(bad_default(name, &kind, &raw)),
            },
            (Kind::Array(ty), Some(raw)) => {
                let Value::Array(items) = &raw else {
                    return Err(bad_default(name, &kind, &raw));
                };
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match types::coerce(*ty, item) {
                        Some(s) => out.push(s),
                        None => return Err(bad_default(name, &kind, &raw)),
                    }
                }
                Some(DefaultValue::Array(out))
            }
        };

        Ok(Field {
            name: name.to_string(),
            kind,
            description,
            default,
            optional,
        })
    }

    pub fn int(name: &str) -> FieldSpec {
        FieldSpec::new(name, Kind::Scalar(ValueType::Int))
    }

    pub fn float(name: &str) -> FieldSpec {
        FieldSpec::new(name, Kind::Scalar(ValueType::Float))
    }

    pub fn bool(name: &str) -> FieldSpec {
        FieldSpec::new(name, Kind::Scalar(ValueType::Bool))
    }

    pub fn string(name: &str) -> FieldSpec {
        FieldSpec::new(name, Kind::Scalar(ValueType::String))
    }

    pub fn array(name: &str, element: ValueType) -> FieldSpec {
        FieldSpec::new(name, Kind::Array(element))
    }

    pub fn nested(name: &str, schema: &Arc<Schema>) -> FieldSpec {
        FieldSpec::new(name, Kind::Struct(Arc::clone(schema)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Non-optional and without a default: some layer must supply a value.
    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }
}

fn bad_default(name: &str, kind: &Kind, raw: &Value) -> ConfigError {
    ConfigError::Schema(format!(
        "default for field '{name}' does not match its type: expected {kind}, got {}",
        types::describe_received(raw)
    ))
}

/// Declaration-time builder for a [`Field`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: Kind,
    description: Option<String>,
    default: Option<Value>,
    optional: bool,
}

impl FieldSpec {
    pub fn new(name: &str, kind: Kind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: None,
            default: None,
            optional: false,
        }
    }

    /// Help text, shown in CLI help and carried on the descriptor.
    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(self) -> Result<Field, ConfigError> {
        Field::describe(
            &self.name,
            self.kind,
            self.description,
            self.default,
            self.optional,
        )
    }
}
