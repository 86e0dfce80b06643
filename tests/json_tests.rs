mod common;

use brrtcodec::json::{from_json, to_json};
use brrtcodec::schema::{MemberDef, RecordDef, TypeAnnotation, WireMetadata};
use brrtcodec::{Case, CodecError, SerializerConfig, Value};
use common::fixtures::{book_annotation, book_root, dune};
use rust_decimal::Decimal;
use serde_json::json;

fn parsed(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_book_round_trip() {
    let config = SerializerConfig::default();
    let text = to_json(&dune(), &book_root(), &config).unwrap();
    assert_eq!(
        parsed(&text),
        json!({
            "bookId": 42,
            "title": "Dune",
            "publicationDate": "1973-01-01T21:52:13.000Z",
            "rating": 4.5,
            "tags": ["sf", "classic"],
            "author": {"name": "Frank Herbert", "born": null}
        })
    );
    assert_eq!(from_json(&text, &book_root(), &config).unwrap(), dune());
}

#[test]
fn test_missing_optional_members_become_null() {
    let config = SerializerConfig::default();
    let text = r#"{"bookId": 1, "title": "Untitled", "publicationDate": "2001-02-03T04:05:06+02:00"}"#;
    let value = from_json(text, &book_root(), &config).unwrap();
    assert_eq!(value.get("rating"), Some(&Value::Null));
    assert_eq!(value.get("author"), Some(&Value::Null));
    assert_eq!(value.get("tags"), Some(&Value::List(Vec::new())));
}

#[test]
fn test_missing_required_member() {
    let config = SerializerConfig::default();
    let err = from_json(r#"{"title": "Dune"}"#, &book_root(), &config).unwrap_err();
    assert_eq!(
        err,
        CodecError::MissingRequiredField {
            key: "bookId".to_string()
        }
    );
}

#[test]
fn test_root_marker_required() {
    let config = SerializerConfig::default();
    let err = from_json("{}", &book_annotation(), &config).unwrap_err();
    assert_eq!(err.kind(), "SchemaError");
    let err = to_json(&dune(), &book_annotation(), &config).unwrap_err();
    assert_eq!(err.kind(), "SchemaError");
}

#[test]
fn test_union_tries_declared_order() {
    let config = SerializerConfig::default();
    let root = TypeAnnotation::union(vec![TypeAnnotation::integer(), TypeAnnotation::string()]).json_root();
    assert_eq!(from_json(r#""42""#, &root, &config).unwrap(), Value::Int(42));
    assert_eq!(from_json(r#""forty-two""#, &root, &config).unwrap(), Value::from("forty-two"));

    let swapped = TypeAnnotation::union(vec![TypeAnnotation::string(), TypeAnnotation::integer()]).json_root();
    assert_eq!(from_json(r#""42""#, &swapped, &config).unwrap(), Value::from("42"));
}

#[test]
fn test_union_exhausted_is_type_mismatch() {
    let config = SerializerConfig::default();
    let root = TypeAnnotation::union(vec![TypeAnnotation::integer(), TypeAnnotation::boolean()]).json_root();
    let err = from_json("[1, 2]", &root, &config).unwrap_err();
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn test_explicit_tag_beats_renamer() {
    let config = SerializerConfig::default();
    let root = TypeAnnotation::record(RecordDef::new(
        "Page",
        vec![
            MemberDef::required(
                "page_size",
                TypeAnnotation::integer().with(WireMetadata::json_property("per_page")),
            ),
            MemberDef::required("page_number", TypeAnnotation::integer()),
        ],
    ))
    .json_root();
    let value = from_json(r#"{"per_page": 20, "pageNumber": 3}"#, &root, &config).unwrap();
    assert_eq!(value.get("page_size"), Some(&Value::Int(20)));
    assert_eq!(
        parsed(&to_json(&value, &root, &config).unwrap()),
        json!({"per_page": 20, "pageNumber": 3})
    );
}

#[test]
fn test_renamer_pair_reproduces_wire_casing() {
    let config = SerializerConfig::from_cases(Case::Pascal, Case::Snake);
    let root = TypeAnnotation::record(RecordDef::new(
        "Order",
        vec![
            MemberDef::required("order_id", TypeAnnotation::integer()),
            MemberDef::required("extra", TypeAnnotation::dict()),
        ],
    ))
    .json_root();
    let text = r#"{"OrderId": 9, "Extra": {"GiftWrap": true, "DeliveryNote": "leave at door"}}"#;
    let value = from_json(text, &root, &config).unwrap();
    assert_eq!(value.get("order_id"), Some(&Value::Int(9)));
    assert_eq!(
        value.get("extra").and_then(|e| e.get("gift_wrap")),
        Some(&Value::Bool(true))
    );
    assert_eq!(parsed(&to_json(&value, &root, &config).unwrap()), parsed(text));
}

#[test]
fn test_decimal_default_passes_through_codec() {
    let config = SerializerConfig::default();
    let root = TypeAnnotation::record(RecordDef::new(
        "Quote",
        vec![MemberDef::with_default(
            "scale",
            TypeAnnotation::decimal(),
            Decimal::ONE,
        )],
    ))
    .json_root();
    let value = from_json("{}", &root, &config).unwrap();
    assert_eq!(value.get("scale"), Some(&Value::Decimal(Decimal::ONE)));
    assert_eq!(to_json(&value, &root, &config).unwrap(), r#"{"scale":1}"#);
}

#[test]
fn test_malformed_text_is_format_error() {
    let config = SerializerConfig::default();
    let err = from_json("{not json", &book_root(), &config).unwrap_err();
    assert_eq!(err.kind(), "FormatError");

    let bad_date = r#"{"bookId": 1, "title": "x", "publicationDate": "yesterday"}"#;
    let err = from_json(bad_date, &book_root(), &config).unwrap_err();
    assert_eq!(err.kind(), "FormatError");
}

#[test]
fn test_absent_optional_ignores_default() {
    let config = SerializerConfig::default();
    let root = TypeAnnotation::record(RecordDef::new(
        "Item",
        vec![
            MemberDef::required("id", TypeAnnotation::integer()),
            MemberDef::with_default("limit", TypeAnnotation::optional(TypeAnnotation::integer()), 5_i64),
            MemberDef::required("title", TypeAnnotation::string()),
        ],
    ))
    .json_root();

    let item = from_json(r#"{"id": 1, "title": "t"}"#, &root, &config).unwrap();
    assert_eq!(item.get("limit"), Some(&Value::Null));
    assert_eq!(parsed(&to_json(&item, &root, &config).unwrap()), json!({"id": 1, "limit": null, "title": "t"}));

    let limited = from_json(r#"{"id": 1, "limit": 3, "title": "t"}"#, &root, &config).unwrap();
    assert_eq!(limited.get("limit"), Some(&Value::Int(3)));
}
