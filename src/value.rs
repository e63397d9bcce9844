//! Runtime values exchanged with the codec (raw and transformed data).

use std::collections::HashMap;
use std::fmt;

/// Ordered element sequences keyed by field name. Every field reads and
/// writes exactly `array_length` elements; missing entries default to
/// [`Value::Absent`].
pub type ValueMap = HashMap<String, Vec<Value>>;

/// A single field element (or one array slot of a repeated field).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// No value supplied or decoded; encodes as the reserved zero code.
    #[default]
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(f.round() as i64),
            Value::Bool(b) => Some(*b as i64),
            Value::String(s) => s.trim().parse().ok(),
            Value::Absent => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(*b as i64 as f64),
            Value::String(s) => s.trim().parse().ok(),
            Value::Absent => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Absent => write!(f, "(absent)"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercions() {
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Float(2.6).as_i64(), Some(3));
        assert_eq!(Value::String("42".to_string()).as_i64(), Some(42));
        assert_eq!(Value::Absent.as_i64(), None);
    }

    #[test]
    fn bool_coercions() {
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Int(3).as_bool(), Some(true));
    }
}
