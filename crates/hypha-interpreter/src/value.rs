//! The runtime value domain: a compact tagged value type rather than a
//! loose, deeply-hierarchical representation.

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::fmt;

/// A runtime value. `Null` is the bottom value returned for unresolved
/// identifiers, unknown functions, and division by zero — none of these
/// throw.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Queue(VecDeque<Value>),
    Map(IndexMap<String, Value>),
    /// A frequency-shaped payload or an ad hoc object construction result.
    /// Keeps field order: insertion-ordered, for deterministic iteration.
    Record(IndexMap<String, Value>),
    Null,
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Value {
        match self {
            Value::Record(fields) | Value::Map(fields) => fields.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Queue(items) => Some(items.len()),
            Value::Map(items) | Value::Record(items) => Some(items.len()),
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "{b:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Queue(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(fields) | Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_of_scalars() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Integer(1).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Str("x".into()).is_truthy());
    }

    #[test]
    fn field_access_on_non_record_is_null() {
        assert_eq!(Value::Integer(5).field("x"), Value::Null);
    }

    #[test]
    fn field_access_on_record() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Value::Str("world".into()));
        let record = Value::Record(fields);
        assert_eq!(record.field("name"), Value::Str("world".into()));
        assert_eq!(record.field("missing"), Value::Null);
    }

    #[test]
    fn len_of_each_container_kind() {
        assert_eq!(Value::List(vec![Value::Integer(1), Value::Integer(2)]).len(), Some(2));
        assert_eq!(Value::Str("hello".into()).len(), Some(5));
        assert_eq!(Value::Integer(1).len(), None);
    }

    #[test]
    fn display_formats_record_in_insertion_order() {
        let mut fields = IndexMap::new();
        fields.insert("b".to_string(), Value::Integer(2));
        fields.insert("a".to_string(), Value::Integer(1));
        assert_eq!(Value::Record(fields).to_string(), "{b: 2, a: 1}");
    }
}
