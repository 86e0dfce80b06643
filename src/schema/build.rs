//! Wire formats and setup-time schema validation.
//!
//! Runs once per route, before any request is served: root markers, record
//! well-formedness and the XML root tag. Failures are `SchemaError`s.

use super::inspect::{
    base_type, json_metadata, literal_kind, strip_metadata, unwrap_optional, xml_metadata,
};
use super::types::{MetadataKind, RecordDef, TypeAnnotation, WireMetadata};
use crate::error::{CodecError, CodecResult};
use std::fmt;
use tracing::debug;

/// Maximum nesting depth walked when validating a schema.
const MAX_SCHEMA_DEPTH: usize = 64;

/// The two text wire formats the engines speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Json,
    Xml,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Json => write!(f, "JSON"),
            WireFormat::Xml => write!(f, "XML"),
        }
    }
}

/// Check that `annotation` may be used as the root of a serialization entry point.
///
/// JSON roots must carry [`WireMetadata::JsonValue`]; XML roots must carry an
/// [`WireMetadata::XmlEntity`] naming the document element.
///
/// # Errors
///
/// `SchemaError` when the marker is missing or the wrong kind.
pub fn validate_root(annotation: &TypeAnnotation, format: WireFormat) -> CodecResult<()> {
    let ok = match format {
        WireFormat::Json => matches!(json_metadata(annotation), Some(WireMetadata::JsonValue)),
        WireFormat::Xml => matches!(
            xml_metadata(annotation),
            Some(WireMetadata::XmlEntity { .. })
        ),
    };
    if ok {
        Ok(())
    } else {
        let expected = match format {
            WireFormat::Json => "a JsonValue",
            WireFormat::Xml => "an XmlEntity",
        };
        Err(CodecError::schema(format!(
            "expected the root value {} to have {} annotation",
            annotation, expected
        )))
    }
}

/// The root tag of an XML entry point.
///
/// # Errors
///
/// `SchemaError` when the annotation is not an XML root.
pub fn xml_root_tag(annotation: &TypeAnnotation) -> CodecResult<&str> {
    validate_root(annotation, WireFormat::Xml)?;
    xml_metadata(annotation)
        .and_then(WireMetadata::tag)
        .ok_or_else(|| CodecError::schema("XML root has no tag"))
}

/// Walk a schema tree once, at setup time, and reject shapes the engines
/// cannot process.
///
/// Checks that unions are non-empty, that record members never use the bare
/// `JsonValue` marker (a member is always a property), that attributes only
/// decorate scalar members, and that body markers only appear at the top level.
///
/// # Errors
///
/// `SchemaError` describing the first problem found.
pub fn validate_schema(annotation: &TypeAnnotation) -> CodecResult<()> {
    let mut visited = Vec::new();
    walk(annotation, 0, true, &mut visited)
}

fn walk(
    annotation: &TypeAnnotation,
    depth: usize,
    top_level: bool,
    visited: &mut Vec<*const RecordDef>,
) -> CodecResult<()> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err(CodecError::schema(format!(
            "schema nesting deeper than {} levels",
            MAX_SCHEMA_DEPTH
        )));
    }
    match base_type(annotation) {
        TypeAnnotation::Literal(_) | TypeAnnotation::NoneType | TypeAnnotation::Dict => Ok(()),
        TypeAnnotation::Union(members) => {
            if members.iter().all(|m| matches!(m, TypeAnnotation::NoneType)) {
                return Err(CodecError::schema("union has no concrete alternative"));
            }
            members
                .iter()
                .try_for_each(|m| walk(m, depth + 1, false, visited))
        }
        TypeAnnotation::List(element) => walk(element, depth + 1, false, visited),
        TypeAnnotation::Body(inner) => {
            if !top_level {
                return Err(CodecError::schema("Body marker is only valid on a parameter"));
            }
            walk(inner, depth + 1, false, visited)
        }
        TypeAnnotation::Record(def) => {
            let ptr = std::sync::Arc::as_ptr(def);
            if visited.contains(&ptr) {
                return Ok(());
            }
            visited.push(ptr);
            for member in &def.members {
                let (member_type, metadata) = strip_metadata(&member.annotation);
                for meta in &metadata {
                    match meta.kind() {
                        MetadataKind::JsonValue => {
                            return Err(CodecError::schema(format!(
                                "member '{}' of {} must be a JSON property, not a bare value",
                                member.name, def.name
                            )))
                        }
                        MetadataKind::XmlAttribute
                            if literal_kind(&unwrap_optional(member_type)).is_none() =>
                        {
                            return Err(CodecError::schema(format!(
                                "member '{}' of {} is an XML attribute but not a scalar",
                                member.name, def.name
                            )))
                        }
                        _ => {}
                    }
                }
                walk(member_type, depth + 1, false, visited)?;
            }
            debug!(record = %def.name, members = def.members.len(), "Record schema validated");
            Ok(())
        }
        // base_type never returns Annotated
        TypeAnnotation::Annotated(inner, _) => walk(inner, depth + 1, top_level, visited),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MemberDef;

    #[test]
    fn test_json_root_required() {
        let bare = TypeAnnotation::integer();
        let err = validate_root(&bare, WireFormat::Json).unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
        assert!(validate_root(&bare.json_root(), WireFormat::Json).is_ok());
    }

    #[test]
    fn test_xml_root_must_be_entity() {
        let attr = TypeAnnotation::integer().with(WireMetadata::xml_attribute("id"));
        assert!(validate_root(&attr, WireFormat::Xml).is_err());
        let root = TypeAnnotation::integer().xml_root("Id");
        assert_eq!(xml_root_tag(&root).unwrap(), "Id");
    }

    #[test]
    fn test_member_json_value_rejected() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Bad",
            vec![MemberDef::required(
                "x",
                TypeAnnotation::integer().with(WireMetadata::JsonValue),
            )],
        ));
        let err = validate_schema(&ann).unwrap_err();
        assert!(err.to_string().contains("must be a JSON property"));
    }

    #[test]
    fn test_attribute_on_list_rejected() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Bad",
            vec![MemberDef::required(
                "xs",
                TypeAnnotation::list(TypeAnnotation::integer())
                    .with(WireMetadata::xml_attribute("xs")),
            )],
        ));
        assert!(validate_schema(&ann).is_err());
    }

    #[test]
    fn test_nested_body_rejected() {
        let ann = TypeAnnotation::list(TypeAnnotation::body(TypeAnnotation::string()));
        assert!(validate_schema(&ann).is_err());
        assert!(validate_schema(&TypeAnnotation::body(TypeAnnotation::string())).is_ok());
    }

    #[test]
    fn test_empty_union_rejected() {
        assert!(validate_schema(&TypeAnnotation::union(vec![TypeAnnotation::NoneType])).is_err());
    }
}
