//! Runtime value cells.

use std::fmt;

use crate::resolver::ConstantValue;

/// A value stored in a slot or on the operand stack.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A declared slot that was never written
    #[default]
    Hole,
    /// String
    String(String),
    /// Integer
    Integer(i64),
    /// Float (IEEE 754 double)
    Float(f64),
}

impl Value {
    /// Returns true if this value is a hole.
    pub fn is_hole(&self) -> bool {
        matches!(self, Value::Hole)
    }

    /// Widens a numeric value to `f64`; `None` for holes and strings.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Hole | Value::String(_) => None,
        }
    }

    /// Returns the kind of this value as a string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Hole => "hole",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
        }
    }
}

impl From<ConstantValue> for Value {
    fn from(constant: ConstantValue) -> Self {
        match constant {
            ConstantValue::Float(n) => Value::Float(n),
            ConstantValue::Integer(n) => Value::Integer(n),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Hole => write!(f, "<hole>"),
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            // Keep a trailing `.0` so floats never print like integers
            Value::Float(n) => write!(f, "{:?}", n),
        }
    }
}
