//! # JSON Module
//!
//! Typed deserialization and serialization between JSON text and [`Value`]s.
//!
//! The engines walk a [`TypeAnnotation`] together with a `serde_json` tree:
//!
//! 1. **Literal** - scalar codec; native JSON numbers and booleans are accepted
//!    as well as their text forms, and a one-element array is unwrapped first
//! 2. **Optional** - `null`, `""`, `[]` and `{}` are absent
//! 3. **Union** - alternatives are tried in declared order, first success wins
//! 4. **List** - element-wise over a JSON array
//! 5. **Typed record** - one object property per member, keyed by the member's
//!    `JsonProperty` tag or, without one, by the serialize-direction renamer
//!
//! [`from_json`] and [`to_json`] are the text entry points; both require the
//! root annotation to carry the `JsonValue` marker.
//!
//! ## Example
//!
//! ```rust
//! use brrtcodec::json::{from_json, to_json};
//! use brrtcodec::schema::{MemberDef, RecordDef, TypeAnnotation, WireMetadata};
//! use brrtcodec::{SerializerConfig, Value};
//!
//! let book = TypeAnnotation::record(RecordDef::new(
//!     "Book",
//!     vec![
//!         MemberDef::required(
//!             "book_id",
//!             TypeAnnotation::integer().with(WireMetadata::json_property("bookId")),
//!         ),
//!         MemberDef::required("title", TypeAnnotation::string()),
//!     ],
//! ))
//! .json_root();
//!
//! let config = SerializerConfig::default();
//! let value = from_json(r#"{"bookId": 42, "title": "Dune"}"#, &book, &config).unwrap();
//! assert_eq!(value.get("book_id"), Some(&Value::Int(42)));
//! assert_eq!(to_json(&value, &book, &config).unwrap(), r#"{"bookId":42,"title":"Dune"}"#);
//! ```

mod de;
mod ser;

pub use de::{deserialize, is_empty_node};
pub use ser::{decimal_node, serialize};

use crate::error::{CodecError, CodecResult};
use crate::rename::SerializerConfig;
use crate::schema::{json_metadata, validate_root, MemberDef, TypeAnnotation, WireFormat, WireMetadata};
use crate::value::Value;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Wire key of a record member: its `JsonProperty` tag, else the
/// serialize-direction renamer applied to the member name.
pub(crate) fn member_key(member: &MemberDef, config: &SerializerConfig) -> String {
    match json_metadata(&member.annotation) {
        Some(WireMetadata::JsonProperty { tag, .. }) => tag.clone(),
        _ => config.external_name(&member.name),
    }
}

pub(crate) fn json_type_name(node: &JsonValue) -> &'static str {
    match node {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Parse JSON text and deserialize it against a root annotation.
///
/// # Errors
///
/// `SchemaError` when `root` lacks the `JsonValue` marker, `FormatError` for
/// malformed JSON text, and any error of [`deserialize`].
pub fn from_json(text: &str, root: &TypeAnnotation, config: &SerializerConfig) -> CodecResult<Value> {
    validate_root(root, WireFormat::Json)?;
    let node: JsonValue =
        serde_json::from_str(text).map_err(|e| CodecError::format("JSON", e.to_string()))?;
    debug!(annotation = %root, bytes = text.len(), "Deserializing JSON payload");
    deserialize(&node, root, config)
}

/// Serialize a value against a root annotation and render single-line JSON text.
///
/// # Errors
///
/// `SchemaError` when `root` lacks the `JsonValue` marker, and any error of
/// [`serialize`].
pub fn to_json(value: &Value, root: &TypeAnnotation, config: &SerializerConfig) -> CodecResult<String> {
    validate_root(root, WireFormat::Json)?;
    let node = serialize(value, root, config)?;
    serde_json::to_string(&node).map_err(|e| CodecError::format("JSON", e.to_string()))
}
