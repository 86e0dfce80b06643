use crate::error::{CodecError, CodecResult};
use crate::json;
use crate::rename::SerializerConfig;
use crate::schema::TypeAnnotation;
use crate::value::Value;
use crate::xml;
use chrono::{DateTime, FixedOffset, TimeDelta};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A Rust type with a schema and a lossless mapping to and from [`Value`].
///
/// Implemented here for the literal kinds, `Option<T>` and `Vec<T>`; structs
/// get it from `#[derive(TypedRecord)]`.
pub trait Typed: Sized {
    /// The annotation describing this type, without any root marker.
    fn annotation() -> TypeAnnotation;

    /// Convert into the value tree.
    fn to_value(&self) -> Value;

    /// Convert out of the value tree.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` when the value has another shape, `FormatError` when a
    /// number does not fit the target type.
    fn from_value(value: Value) -> CodecResult<Self>;
}

macro_rules! typed_literal {
    ($ty:ty, $annotation:ident, $variant:ident) => {
        impl Typed for $ty {
            fn annotation() -> TypeAnnotation {
                TypeAnnotation::$annotation()
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> CodecResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(CodecError::mismatch(stringify!($ty), other.type_name())),
                }
            }
        }
    };
}

typed_literal!(String, string, String);
typed_literal!(bool, boolean, Bool);
typed_literal!(i64, integer, Int);
typed_literal!(DateTime<FixedOffset>, timestamp, Timestamp);
typed_literal!(TimeDelta, duration, Duration);

impl Typed for i32 {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::integer()
    }

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Int(v) => i32::try_from(v).map_err(|_| CodecError::format("i32", v.to_string())),
            other => Err(CodecError::mismatch("i32", other.type_name())),
        }
    }
}

impl Typed for f64 {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::float()
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(CodecError::mismatch("f64", other.type_name())),
        }
    }
}

impl Typed for Decimal {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::decimal()
    }

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::Int(v) => Ok(Decimal::from(v)),
            other => Err(CodecError::mismatch("Decimal", other.type_name())),
        }
    }
}

impl<T: Typed> Typed for Option<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::optional(T::annotation())
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Typed::to_value)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::list(T::annotation())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Typed::to_value).collect())
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        value.into_list()?.into_iter().map(T::from_value).collect()
    }
}

/// Remove a member from a record value and convert it.
///
/// An absent member converts from `Value::Null`, so `Option` fields become
/// `None`; any other field reports the member as missing. Used by the code
/// `#[derive(TypedRecord)]` generates.
///
/// # Errors
///
/// `MissingRequiredField` for an absent non-optional member, or any error of
/// [`Typed::from_value`].
pub fn take_member<T: Typed>(record: &mut BTreeMap<String, Value>, name: &str) -> CodecResult<T> {
    match record.remove(name) {
        Some(value) => T::from_value(value),
        None => T::from_value(Value::Null).map_err(|_| CodecError::missing(name)),
    }
}

/// Serialize a typed value as a JSON document.
///
/// # Errors
///
/// Any error of [`json::to_json`].
pub fn to_json<T: Typed>(value: &T, config: &SerializerConfig) -> CodecResult<String> {
    json::to_json(&value.to_value(), &T::annotation().json_root(), config)
}

/// Deserialize a JSON document into a typed value.
///
/// # Errors
///
/// Any error of [`json::from_json`] or [`Typed::from_value`].
pub fn from_json<T: Typed>(text: &str, config: &SerializerConfig) -> CodecResult<T> {
    T::from_value(json::from_json(text, &T::annotation().json_root(), config)?)
}

/// Serialize a typed value as an XML document whose root element is `tag`.
///
/// # Errors
///
/// Any error of [`xml::to_xml`].
pub fn to_xml<T: Typed>(value: &T, tag: &str, config: &SerializerConfig) -> CodecResult<String> {
    xml::to_xml(&value.to_value(), &T::annotation().xml_root(tag), config)
}

/// Deserialize an XML document whose root element is `tag` into a typed value.
///
/// # Errors
///
/// Any error of [`xml::from_xml`] or [`Typed::from_value`].
pub fn from_xml<T: Typed>(text: &str, tag: &str, config: &SerializerConfig) -> CodecResult<T> {
    T::from_value(xml::from_xml(text, &T::annotation().xml_root(tag), config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(String::from_value("x".to_string().to_value()).unwrap(), "x");
        assert_eq!(i32::from_value(Value::Int(7)).unwrap(), 7);
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
        assert_eq!(f64::from_value(Value::Int(2)).unwrap(), 2.0);
        assert!(bool::from_value(Value::from("true")).is_err());
    }

    #[test]
    fn test_option_and_vec() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Some(3_i64).to_value(), Value::Int(3));
        assert_eq!(
            Vec::<i64>::from_value(Value::List(vec![Value::Int(1), Value::Int(2)])).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            Option::<Vec<String>>::annotation(),
            TypeAnnotation::optional(TypeAnnotation::list(TypeAnnotation::string()))
        );
    }

    #[test]
    fn test_take_member() {
        let mut record = BTreeMap::from([("a".to_string(), Value::Int(1))]);
        assert_eq!(take_member::<i64>(&mut record, "a").unwrap(), 1);
        assert_eq!(take_member::<Option<i64>>(&mut record, "b").unwrap(), None);
        let err = take_member::<i64>(&mut record, "c").unwrap_err();
        assert_eq!(err.kind(), "MissingRequiredField");
    }

    #[test]
    fn test_json_helpers() {
        let config = SerializerConfig::default();
        let text = to_json(&vec![Decimal::new(15, 1), Decimal::ONE], &config).unwrap();
        assert_eq!(text, "[1.5,1]");
        let back: Vec<Decimal> = from_json(&text, &config).unwrap();
        assert_eq!(back, vec![Decimal::new(15, 1), Decimal::ONE]);
    }

    #[test]
    fn test_xml_helpers() {
        let config = SerializerConfig::default();
        let text = to_xml(&"hello".to_string(), "Greeting", &config).unwrap();
        assert_eq!(text, "<Greeting>hello</Greeting>");
        let back: String = from_xml(&text, "Greeting", &config).unwrap();
        assert_eq!(back, "hello");
    }
}
