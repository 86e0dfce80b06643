use super::member_key;
use crate::codec::{conform, encode};
use crate::error::{CodecError, CodecResult};
use crate::rename::SerializerConfig;
use crate::schema::{base_type, is_optional, literal_kind, unwrap_optional, LiteralKind, TypeAnnotation};
use crate::value::Value;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

/// Serialize `value` into a JSON node shaped by `annotation`.
///
/// Optional members that hold `Value::Null` are written as `null`; members
/// absent from the record fall back to their declared default and are omitted
/// when optional.
///
/// # Errors
///
/// - `TypeMismatch` when the value does not fit the annotation
/// - `FormatError` for floats JSON cannot represent (NaN, infinities)
/// - `MissingRequiredField` when a required record member is absent
pub fn serialize(
    value: &Value,
    annotation: &TypeAnnotation,
    config: &SerializerConfig,
) -> CodecResult<JsonValue> {
    if let Some(kind) = literal_kind(annotation) {
        return encode_literal(value, kind);
    }
    if is_optional(annotation) {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        return serialize(value, &unwrap_optional(annotation), config);
    }
    match base_type(annotation) {
        TypeAnnotation::Union(alternatives) => {
            for alternative in alternatives {
                match serialize(value, alternative, config) {
                    Ok(node) => return Ok(node),
                    Err(e) => {
                        debug!(union = %annotation, alternative = %alternative, error = %e, "Union alternative rejected");
                    }
                }
            }
            Err(CodecError::mismatch(annotation.to_string(), value.type_name()))
        }
        TypeAnnotation::List(element) => match value {
            Value::List(items) => items
                .iter()
                .map(|item| serialize(item, element, config))
                .collect::<CodecResult<Vec<_>>>()
                .map(JsonValue::Array),
            other => Err(CodecError::mismatch(annotation.to_string(), other.type_name())),
        },
        TypeAnnotation::Dict => match value {
            Value::Record(_) => plain_node(value, config),
            other => Err(CodecError::mismatch("Dict[str, Any]", other.type_name())),
        },
        TypeAnnotation::Record(def) => {
            let Value::Record(members) = value else {
                return Err(CodecError::mismatch(def.name.as_str(), value.type_name()));
            };
            let mut object = Map::new();
            for member in &def.members {
                let key = member_key(member, config);
                let node = match (members.get(&member.name), &member.default) {
                    (Some(v), _) => serialize(v, &member.annotation, config)?,
                    (None, Some(default)) => {
                        let v = conform(default.clone(), &member.annotation)?;
                        serialize(&v, &member.annotation, config)?
                    }
                    (None, None) if is_optional(&member.annotation) => continue,
                    (None, None) => return Err(CodecError::missing(key)),
                };
                object.insert(key, node);
            }
            Ok(JsonValue::Object(object))
        }
        TypeAnnotation::NoneType => match value {
            Value::Null => Ok(JsonValue::Null),
            other => Err(CodecError::mismatch("None", other.type_name())),
        },
        TypeAnnotation::Body(inner) => serialize(value, inner, config),
        TypeAnnotation::Literal(_) | TypeAnnotation::Annotated(..) => Err(CodecError::mismatch(
            annotation.to_string(),
            value.type_name(),
        )),
    }
}

fn encode_literal(value: &Value, kind: LiteralKind) -> CodecResult<JsonValue> {
    match (kind, value) {
        (LiteralKind::String, Value::String(s)) => Ok(JsonValue::String(s.clone())),
        (LiteralKind::Boolean, Value::Bool(b)) => Ok(JsonValue::Bool(*b)),
        (LiteralKind::Integer | LiteralKind::Float | LiteralKind::Decimal, Value::Int(i)) => {
            Ok(JsonValue::from(*i))
        }
        (LiteralKind::Float, Value::Float(x)) => float_node(*x),
        (LiteralKind::Decimal, Value::Decimal(d)) => decimal_node(d),
        // timestamps and durations travel as ISO-8601 strings
        (LiteralKind::Timestamp | LiteralKind::Duration, _) => {
            encode(value, kind).map(JsonValue::String)
        }
        (kind, other) => Err(CodecError::mismatch(kind.to_string(), other.type_name())),
    }
}

fn float_node(x: f64) -> CodecResult<JsonValue> {
    Number::from_f64(x)
        .map(JsonValue::Number)
        .ok_or_else(|| CodecError::format("JSON number", x.to_string()))
}

/// JSON has no decimal type: integral decimals become integer numbers and the
/// rest become (possibly lossy) floats.
pub fn decimal_node(d: &Decimal) -> CodecResult<JsonValue> {
    let normalized = d.normalize();
    if normalized.fract().is_zero() {
        if let Some(i) = normalized.to_i64() {
            return Ok(JsonValue::from(i));
        }
    }
    let x = normalized
        .to_f64()
        .ok_or_else(|| CodecError::format("JSON number", normalized.to_string()))?;
    float_node(x)
}

/// Untyped conversion used for `Dict` annotations. Record keys pass through
/// the serialize-direction renamer at every depth.
fn plain_node(value: &Value, config: &SerializerConfig) -> CodecResult<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(x) => float_node(*x)?,
        Value::Decimal(d) => decimal_node(d)?,
        Value::Timestamp(_) => encode(value, LiteralKind::Timestamp).map(JsonValue::String)?,
        Value::Duration(_) => encode(value, LiteralKind::Duration).map(JsonValue::String)?,
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|i| plain_node(i, config))
                .collect::<CodecResult<Vec<_>>>()?,
        ),
        Value::Record(members) => {
            let mut object = Map::new();
            for (k, v) in members {
                object.insert(config.external_name(k), plain_node(v, config)?);
            }
            JsonValue::Object(object)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_timestamp;
    use crate::schema::{MemberDef, RecordDef, WireMetadata};
    use serde_json::json;

    fn config() -> SerializerConfig {
        SerializerConfig::default()
    }

    #[test]
    fn test_decimal_numbers() {
        assert_eq!(decimal_node(&Decimal::new(100, 2)).unwrap(), json!(1));
        assert_eq!(decimal_node(&Decimal::new(125, 1)).unwrap(), json!(12.5));
    }

    #[test]
    fn test_nan_rejected() {
        let err = serialize(&Value::Float(f64::NAN), &TypeAnnotation::float(), &config()).unwrap_err();
        assert_eq!(err.kind(), "FormatError");
    }

    #[test]
    fn test_timestamp_written_as_profile_text() {
        let ts = parse_timestamp("1973-01-01T21:52:13Z").unwrap();
        let node = serialize(&Value::Timestamp(ts), &TypeAnnotation::timestamp(), &config()).unwrap();
        assert_eq!(node, json!("1973-01-01T21:52:13.000Z"));
    }

    #[test]
    fn test_record_keys_and_defaults() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Book",
            vec![
                MemberDef::required(
                    "book_id",
                    TypeAnnotation::integer().with(WireMetadata::json_property("id")),
                ),
                MemberDef::required("page_count", TypeAnnotation::integer()),
                MemberDef::required("subtitle", TypeAnnotation::optional(TypeAnnotation::string())),
                MemberDef::with_default("language", TypeAnnotation::string(), "en"),
            ],
        ));
        let value = Value::record([("book_id", Value::Int(1)), ("page_count", Value::Int(320))]);
        let node = serialize(&value, &ann, &config()).unwrap();
        assert_eq!(node, json!({"id": 1, "pageCount": 320, "language": "en"}));
    }

    #[test]
    fn test_record_missing_required() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Book",
            vec![MemberDef::required("title", TypeAnnotation::string())],
        ));
        let err = serialize(&Value::record::<&str, _>([]), &ann, &config()).unwrap_err();
        assert_eq!(err.kind(), "MissingRequiredField");
    }

    #[test]
    fn test_union_serializes_first_fitting() {
        let ann = TypeAnnotation::union(vec![TypeAnnotation::integer(), TypeAnnotation::string()]);
        assert_eq!(serialize(&Value::from("x"), &ann, &config()).unwrap(), json!("x"));
        assert_eq!(serialize(&Value::Int(3), &ann, &config()).unwrap(), json!(3));
    }

    #[test]
    fn test_dict_keys_renamed() {
        let value = Value::record([("first_name", Value::from("Ada"))]);
        let node = serialize(&value, &TypeAnnotation::dict(), &config()).unwrap();
        assert_eq!(node, json!({"firstName": "Ada"}));
    }
}
