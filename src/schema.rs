//! Structure schemas: ordered, named collections of field descriptors.
//!
//! A schema is built once through [`SchemaBuilder`] and then shared behind an
//! [`Arc`]. It is only the *declaration*; live values are held by a
//! [`Config`](crate::Config) instantiated from it. Many instances can share one
//! schema, and a schema can be nested inside others via
//! [`Field::nested`](crate::Field::nested).

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldSpec};

#[derive(Debug)]
pub struct Schema {
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
}

impl Schema {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Create a fresh instance populated with defaults.
    pub fn instantiate(self: &Arc<Self>) -> Config {
        Config::new(self)
    }

    /// Validate `value` against this schema without keeping an instance around.
    ///
    /// Returns the normalized projection: every field present, values coerced,
    /// defaults filled in.
    pub fn validate_value(self: &Arc<Self>, value: &Value) -> Result<Value, ConfigError> {
        let mut config = self.instantiate();
        config.merge(value)?;
        Ok(config.to_value())
    }
}

/// Builder for a [`Schema`]. Fields keep the order they are added in.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Validate every field and freeze the schema.
    ///
    /// Fails on duplicate field names (case-sensitive) and on any invalid field
    /// descriptor.
    pub fn build(self) -> Result<Arc<Schema>, ConfigError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in self.fields {
            if !seen.insert(spec.name().to_string()) {
                return Err(ConfigError::Schema(format!(
                    "duplicate field '{}' in {}",
                    spec.name(),
                    self.name
                )));
            }
            fields.push(spec.build()?);
        }
        Ok(Arc::new(Schema {
            name: self.name,
            description: self.description,
            fields,
        }))
    }
}
