use super::iso8601::{format_duration, format_timestamp, parse_duration, parse_timestamp};
use crate::error::{CodecError, CodecResult};
use crate::schema::LiteralKind;
use crate::value::Value;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Decode wire text into a value of the given literal kind.
///
/// Strings are taken verbatim; every other kind ignores surrounding
/// whitespace. Booleans are permissive: `"true"` in any letter case is
/// `true`, every other text is `false`.
///
/// # Errors
///
/// `FormatError` when the text is not a valid rendering of `kind`.
pub fn decode(text: &str, kind: LiteralKind) -> CodecResult<Value> {
    let err = || CodecError::format(kind.to_string(), text);
    match kind {
        LiteralKind::String => Ok(Value::String(text.to_string())),
        LiteralKind::Boolean => Ok(Value::Bool(text.trim().eq_ignore_ascii_case("true"))),
        LiteralKind::Integer => text.trim().parse().map(Value::Int).map_err(|_| err()),
        LiteralKind::Float => text.trim().parse().map(Value::Float).map_err(|_| err()),
        LiteralKind::Decimal => parse_decimal(text.trim()).map(Value::Decimal).ok_or_else(err),
        LiteralKind::Timestamp => parse_timestamp(text.trim()).map(Value::Timestamp),
        LiteralKind::Duration => parse_duration(text.trim()).map(Value::Duration),
    }
}

/// Encode a value of the given literal kind as wire text.
///
/// Integers are accepted where floats or decimals are expected.
///
/// # Errors
///
/// `TypeMismatch` when the value does not belong to `kind`.
pub fn encode(value: &Value, kind: LiteralKind) -> CodecResult<String> {
    match (kind, value) {
        (LiteralKind::String, Value::String(s)) => Ok(s.clone()),
        (LiteralKind::Boolean, Value::Bool(b)) => Ok(b.to_string()),
        (LiteralKind::Integer, Value::Int(i)) => Ok(i.to_string()),
        (LiteralKind::Float, Value::Float(x)) => Ok(x.to_string()),
        (LiteralKind::Float, Value::Int(i)) => Ok((*i as f64).to_string()),
        (LiteralKind::Decimal, Value::Decimal(d)) => Ok(d.normalize().to_string()),
        (LiteralKind::Decimal, Value::Int(i)) => Ok(i.to_string()),
        (LiteralKind::Timestamp, Value::Timestamp(t)) => Ok(format_timestamp(t)),
        (LiteralKind::Duration, Value::Duration(d)) => Ok(format_duration(d)),
        (kind, other) => Err(CodecError::mismatch(kind.to_string(), other.type_name())),
    }
}

/// Bring an in-memory value into the representation of `kind`.
///
/// Values already of the right kind pass through unchanged, strings are decoded
/// through [`decode`], and integers widen to floats and decimals. Used for
/// declared defaults, which may be written either as typed values or as wire
/// text.
///
/// # Errors
///
/// `FormatError` for undecodable strings, `TypeMismatch` for anything else that
/// does not fit.
pub fn coerce(value: Value, kind: LiteralKind) -> CodecResult<Value> {
    match (kind, value) {
        (LiteralKind::String, v @ Value::String(_))
        | (LiteralKind::Boolean, v @ Value::Bool(_))
        | (LiteralKind::Integer, v @ Value::Int(_))
        | (LiteralKind::Float, v @ Value::Float(_))
        | (LiteralKind::Decimal, v @ Value::Decimal(_))
        | (LiteralKind::Timestamp, v @ Value::Timestamp(_))
        | (LiteralKind::Duration, v @ Value::Duration(_)) => Ok(v),
        (LiteralKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (LiteralKind::Decimal, Value::Int(i)) => Ok(Value::Decimal(Decimal::from(i))),
        (kind, Value::String(s)) => decode(&s, kind),
        (kind, other) => Err(CodecError::mismatch(kind.to_string(), other.type_name())),
    }
}

/// Parse plain (`"12.50"`) or scientific (`"1.25e1"`) decimal text.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}
