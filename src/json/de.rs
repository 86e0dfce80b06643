use super::{json_type_name, member_key};
use crate::codec::{absent_member, decode, parse_decimal};
use crate::error::{CodecError, CodecResult};
use crate::rename::SerializerConfig;
use crate::schema::{base_type, is_optional, literal_kind, unwrap_optional, LiteralKind, TypeAnnotation};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::debug;

/// JSON emptiness test for optionals: `null`, `""`, `[]` and `{}` are all absent.
#[must_use]
pub fn is_empty_node(node: &JsonValue) -> bool {
    match node {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Bool(_) | JsonValue::Number(_) => false,
    }
}

/// Deserialize a parsed JSON node against `annotation`.
///
/// Dispatch order is literal, optional, union, list, dictionary, typed record.
/// Wire metadata travels inside `annotation` and is consulted for record member
/// keys.
///
/// # Errors
///
/// - `TypeMismatch` when the node has the wrong shape or every union
///   alternative rejects it
/// - `FormatError` when scalar text cannot be decoded
/// - `MissingRequiredField` when a record lacks a required member key
pub fn deserialize(
    node: &JsonValue,
    annotation: &TypeAnnotation,
    config: &SerializerConfig,
) -> CodecResult<Value> {
    if let Some(kind) = literal_kind(annotation) {
        return decode_literal(node, kind);
    }
    if is_optional(annotation) {
        if is_empty_node(node) {
            return Ok(Value::Null);
        }
        return deserialize(node, &unwrap_optional(annotation), config);
    }
    match base_type(annotation) {
        TypeAnnotation::Union(alternatives) => {
            for (index, alternative) in alternatives.iter().enumerate() {
                match deserialize(node, alternative, config) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        debug!(
                            union = %annotation,
                            alternative = %alternative,
                            index,
                            error = %e,
                            "Union alternative rejected"
                        );
                    }
                }
            }
            Err(CodecError::mismatch(annotation.to_string(), json_type_name(node)))
        }
        TypeAnnotation::List(element) => match node {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| deserialize(item, element, config))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::List),
            other => Err(CodecError::mismatch(annotation.to_string(), json_type_name(other))),
        },
        TypeAnnotation::Dict => match node {
            JsonValue::Object(_) => Ok(plain_value(node, config)),
            other => Err(CodecError::mismatch("Dict[str, Any]", json_type_name(other))),
        },
        TypeAnnotation::Record(def) => {
            let JsonValue::Object(map) = node else {
                return Err(CodecError::mismatch(def.name.as_str(), json_type_name(node)));
            };
            let mut record = BTreeMap::new();
            for member in &def.members {
                let key = member_key(member, config);
                let value = match map.get(&key) {
                    Some(child) => deserialize(child, &member.annotation, config)?,
                    None => absent_member(member, &key)?,
                };
                record.insert(member.name.clone(), value);
            }
            Ok(Value::Record(record))
        }
        TypeAnnotation::NoneType => match node {
            JsonValue::Null => Ok(Value::Null),
            other => Err(CodecError::mismatch("None", json_type_name(other))),
        },
        TypeAnnotation::Body(inner) => deserialize(node, inner, config),
        TypeAnnotation::Literal(_) | TypeAnnotation::Annotated(..) => Err(CodecError::mismatch(
            annotation.to_string(),
            json_type_name(node),
        )),
    }
}

fn decode_literal(node: &JsonValue, kind: LiteralKind) -> CodecResult<Value> {
    // Form and query encodings produce a list for every field
    if let JsonValue::Array(items) = node {
        if let [only] = items.as_slice() {
            return decode_literal(only, kind);
        }
    }
    match (kind, node) {
        (_, JsonValue::String(text)) => decode(text, kind),
        (LiteralKind::Boolean, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (LiteralKind::Integer, JsonValue::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| CodecError::format(kind.to_string(), n.to_string())),
        (LiteralKind::Float, JsonValue::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| CodecError::format(kind.to_string(), n.to_string())),
        (LiteralKind::Decimal, JsonValue::Number(n)) => {
            let text = n.to_string();
            parse_decimal(&text)
                .map(Value::Decimal)
                .ok_or_else(|| CodecError::format(kind.to_string(), text))
        }
        (kind, other) => Err(CodecError::mismatch(kind.to_string(), json_type_name(other))),
    }
}

/// Untyped conversion used for `Dict` annotations. Object keys are passed
/// through the deserialize-direction renamer at every depth.
fn plain_value(node: &JsonValue, config: &SerializerConfig) -> Value {
    match node {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => Value::List(items.iter().map(|i| plain_value(i, config)).collect()),
        JsonValue::Object(map) => Value::Record(
            map.iter()
                .map(|(k, v)| (config.internal_name(k), plain_value(v, config)))
                .collect(),
        ),
    }
}
