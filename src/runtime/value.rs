//! Runtime value types.
//!
//! A binding in an [`Environment`] holds a [`Value`]: a primitive [`Scalar`], a handle to an
//! object instance, or a whole nested environment (the tuple of a macro's named results).
//! Consumers match on the variant; nothing is coerced implicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::runtime::environment::Environment;
use crate::runtime::registry::InstanceId;

/// A primitive attribute or argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
    /// Sentinel for an evaluation that could not be completed. Serializes as `null`.
    Unknown,
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
            Scalar::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Scalar::Unknown)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Natural string form, used by string concatenation. Integral numbers print without a
/// fractional part (`5`, not `5.0`).
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => f.write_str(s),
            Scalar::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Anything a variable can be bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Instance(InstanceId),
    /// The full set of named results of a macro call.
    Tuple(Environment),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.type_name(),
            Value::Instance(_) => "instance",
            Value::Tuple(_) => "tuple",
        }
    }

    pub fn as_tuple(&self) -> Option<&Environment> {
        match self {
            Value::Tuple(env) => Some(env),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<InstanceId> for Value {
    fn from(value: InstanceId) -> Self {
        Value::Instance(value)
    }
}
