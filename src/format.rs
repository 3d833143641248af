//! File formats: pure text ⇄ nested mapping conversions.
//!
//! The format is picked from the file extension: `.json`, `.yaml`/`.yml`, or
//! `.toml`. Parsing always yields a top-level mapping; serializing takes the
//! projection of a config tree. Nothing here touches the filesystem.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::overrides::join;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("non-finite number at '{path}'")]
    NonFinite { path: String },

    #[error("expected a mapping at the top level, found {found}")]
    NotAMapping { found: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Parse a document into a top-level mapping.
    ///
    /// An empty YAML or TOML document is an empty mapping. YAML and TOML can
    /// spell infinities and NaN, which have no counterpart in the mapping
    /// model, so they are rejected here instead of turning into null.
    pub fn parse(self, text: &str) -> Result<Map<String, Value>, FormatError> {
        let value: Value = match self {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml if text.trim().is_empty() => Value::Null,
            Format::Yaml => {
                let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
                check_yaml_finite(&doc, "")?;
                serde_yaml::from_value(doc)?
            }
            Format::Toml => {
                let doc: toml::Table = toml::from_str(text)?;
                for (key, item) in &doc {
                    check_toml_finite(item, key)?;
                }
                serde_json::to_value(doc)?
            }
        };
        match value {
            Value::Object(map) => Ok(map),
            Value::Null if self != Format::Json => Ok(Map::new()),
            other => Err(FormatError::NotAMapping {
                found: kind_name(&other),
            }),
        }
    }

    /// Serialize a projected mapping.
    ///
    /// JSON is indented by four spaces. TOML has no null, so absent values are
    /// left out of TOML output.
    pub fn serialize(self, value: &Value) -> Result<String, FormatError> {
        match self {
            Format::Json => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value.serialize(&mut ser)?;
                buf.push(b'\n');
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Format::Yaml => Ok(serde_yaml::to_string(value)?),
            Format::Toml => Ok(toml::to_string(&strip_nulls(value))?),
        }
    }
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}

fn check_yaml_finite(value: &serde_yaml::Value, path: &str) -> Result<(), FormatError> {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Number(n) if n.is_nan() || n.is_infinite() => Err(FormatError::NonFinite {
            path: path.to_string(),
        }),
        Yaml::Sequence(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check_yaml_finite(item, &format!("{path}[{i}]"))),
        Yaml::Mapping(map) => map.iter().try_for_each(|(key, item)| {
            let key = match key {
                Yaml::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            };
            check_yaml_finite(item, &join(path, &key))
        }),
        Yaml::Tagged(tagged) => check_yaml_finite(&tagged.value, path),
        _ => Ok(()),
    }
}

fn check_toml_finite(value: &toml::Value, path: &str) -> Result<(), FormatError> {
    match value {
        toml::Value::Float(f) if !f.is_finite() => Err(FormatError::NonFinite {
            path: path.to_string(),
        }),
        toml::Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check_toml_finite(item, &format!("{path}[{i}]"))),
        toml::Value::Table(table) => table
            .iter()
            .try_for_each(|(key, item)| check_toml_finite(item, &join(path, key))),
        _ => Ok(()),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
