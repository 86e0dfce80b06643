//! In-memory structured values produced by deserialization and consumed by serialization.

use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, FixedOffset, TimeDelta};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed value shaped by a [`crate::schema::TypeAnnotation`].
///
/// Records are keyed by the *internal* member name; wire keys only exist on the
/// wire side of the engines.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence (`None` for an optional)
    #[default]
    Null,
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Timestamp(DateTime<FixedOffset>),
    Duration(TimeDelta),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the variant, used in mismatch diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Look up a record member by internal name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(name))
    }

    /// Consume a record value, failing with a mismatch for anything else.
    pub fn into_record(self) -> CodecResult<BTreeMap<String, Value>> {
        match self {
            Value::Record(r) => Ok(r),
            other => Err(CodecError::mismatch("record", other.type_name())),
        }
    }

    /// Consume a list value, failing with a mismatch for anything else.
    pub fn into_list(self) -> CodecResult<Vec<Value>> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(CodecError::mismatch("list", other.type_name())),
        }
    }

    /// Build a record from `(name, value)` pairs.
    pub fn record<K, I>(members: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Duration(d) => write!(f, "{}", d),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(members) => {
                write!(f, "{{")?;
                for (i, (k, v)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
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
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder_and_lookup() {
        let v = Value::record([("book_id", Value::Int(42)), ("title", "Dune".into())]);
        assert_eq!(v.get("book_id"), Some(&Value::Int(42)));
        assert_eq!(v.get("title").and_then(Value::as_str), Some("Dune"));
        assert!(v.get("missing").is_none());
    }

    #[test]
    fn test_into_record_mismatch() {
        let err = Value::Int(1).into_record().unwrap_err();
        assert_eq!(err, CodecError::mismatch("record", "integer"));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }
}
