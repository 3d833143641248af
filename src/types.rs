//! Scalar element types and the coercion rules applied on every assignment.
//!
//! Raw input arrives as a [`serde_json::Value`] regardless of where it came from
//! (a parsed JSON/YAML/TOML document, a `set()` call, or a CLI flag string).
//! [`coerce`] turns it into a typed [`Scalar`] or rejects it:
//!
//! | Target   | Accepts                                                          |
//! |----------|------------------------------------------------------------------|
//! | `bool`   | `true`/`false`, and the strings `"true"`/`"false"` in any case   |
//! | `int`    | integers, floats without a fractional part, numeric strings      |
//! | `float`  | any finite number, numeric strings                               |
//! | `string` | strings, plus numbers and bools via their textual form           |
//!
//! Nulls, arrays and mappings are never scalars.

use std::fmt;

use serde_json::{Number, Value};

/// The element type of a scalar or array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    String,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::String => "string",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A coerced, typed primitive held by a value node.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Int(_) => ValueType::Int,
            Scalar::Float(_) => ValueType::Float,
            Scalar::Bool(_) => ValueType::Bool,
            Scalar::Str(_) => ValueType::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Plain-value form used by the projector.
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Int(i) => Value::from(*i),
            // Non-finite floats are rejected by `coerce`, so this never yields null
            // for a stored value.
            Scalar::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// Coerce a raw value into a scalar of type `ty`.
///
/// Returns `None` when the value cannot be represented without loss; callers
/// attach the field path and build the type-mismatch error.
pub fn coerce(ty: ValueType, raw: &Value) -> Option<Scalar> {
    match ty {
        ValueType::Bool => match raw {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Scalar::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Scalar::Bool(false)),
            _ => None,
        },
        ValueType::Int => match raw {
            Value::Number(n) => number_to_int(n),
            Value::String(s) => parse_int(s.trim()),
            _ => None,
        }
        .map(Scalar::Int),
        ValueType::Float => match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
        .map(Scalar::Float),
        ValueType::String => match raw {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
        .map(Scalar::Str),
    }
}

/// Short rendering of a rejected raw value for error messages.
pub(crate) fn describe_received(raw: &Value) -> String {
    match raw {
        Value::Null => "null".into(),
        Value::Array(_) => format!("array {raw}"),
        Value::Object(_) => format!("mapping {raw}"),
        other => other.to_string(),
    }
}

fn number_to_int(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        // Larger than i64::MAX.
        return None;
    }
    n.as_f64().and_then(float_to_int)
}

fn parse_int(s: &str) -> Option<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
}

fn float_to_int(f: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, hence the exclusive upper bound.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
