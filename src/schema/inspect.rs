//! Predicates and extractors over [`TypeAnnotation`].
//!
//! All functions look through `Annotated` wrappers unless they are explicitly
//! about metadata. None of them allocate except `unwrap_optional` when more than
//! one alternative survives.

use super::types::{LiteralKind, MemberDef, MetadataKind, RecordDef, TypeAnnotation, WireMetadata};
use crate::error::{CodecError, CodecResult};
use std::borrow::Cow;

/// Peel every `Annotated` wrapper.
#[must_use]
pub fn base_type(annotation: &TypeAnnotation) -> &TypeAnnotation {
    let mut current = annotation;
    while let TypeAnnotation::Annotated(inner, _) = current {
        current = inner;
    }
    current
}

/// Split an annotation into its base type and every metadata entry attached to
/// it, outermost first.
#[must_use]
pub fn strip_metadata(annotation: &TypeAnnotation) -> (&TypeAnnotation, Vec<&WireMetadata>) {
    let mut metadata = Vec::new();
    let mut current = annotation;
    while let TypeAnnotation::Annotated(inner, list) = current {
        metadata.extend(list.iter());
        current = inner;
    }
    (current, metadata)
}

#[must_use]
pub fn has_metadata_kind(annotation: &TypeAnnotation, kind: MetadataKind) -> bool {
    strip_metadata(annotation)
        .1
        .iter()
        .any(|m| m.kind() == kind)
}

/// First JSON metadata entry, if any.
#[must_use]
pub fn json_metadata(annotation: &TypeAnnotation) -> Option<&WireMetadata> {
    strip_metadata(annotation)
        .1
        .into_iter()
        .find(|m| m.is_json())
}

/// First XML metadata entry, if any.
#[must_use]
pub fn xml_metadata(annotation: &TypeAnnotation) -> Option<&WireMetadata> {
    strip_metadata(annotation)
        .1
        .into_iter()
        .find(|m| m.is_xml())
}

#[must_use]
pub fn literal_kind(annotation: &TypeAnnotation) -> Option<LiteralKind> {
    match base_type(annotation) {
        TypeAnnotation::Literal(kind) => Some(*kind),
        _ => None,
    }
}

/// A union whose last alternative is absence.
#[must_use]
pub fn is_optional(annotation: &TypeAnnotation) -> bool {
    match base_type(annotation) {
        TypeAnnotation::Union(members) => {
            members.len() >= 2 && matches!(members.last(), Some(TypeAnnotation::NoneType))
        }
        _ => false,
    }
}

/// True for every union, optional ones included. Engines test
/// [`is_optional`] first.
#[must_use]
pub fn is_union(annotation: &TypeAnnotation) -> bool {
    matches!(base_type(annotation), TypeAnnotation::Union(_))
}

#[must_use]
pub fn is_list(annotation: &TypeAnnotation) -> bool {
    matches!(base_type(annotation), TypeAnnotation::List(_))
}

#[must_use]
pub fn is_dict(annotation: &TypeAnnotation) -> bool {
    matches!(base_type(annotation), TypeAnnotation::Dict)
}

#[must_use]
pub fn is_typed_record(annotation: &TypeAnnotation) -> bool {
    matches!(base_type(annotation), TypeAnnotation::Record(_))
}

#[must_use]
pub fn is_body(annotation: &TypeAnnotation) -> bool {
    matches!(base_type(annotation), TypeAnnotation::Body(_))
}

/// Whether the annotation is represented on the wire as a container
/// (object or array), looking through optionals.
#[must_use]
pub fn is_container(annotation: &TypeAnnotation) -> bool {
    if is_optional(annotation) {
        return is_container(&unwrap_optional(annotation));
    }
    is_list(annotation) || is_dict(annotation) || is_typed_record(annotation)
}

/// The inner type of a `Body[...]` marker; non-body annotations are returned as-is.
#[must_use]
pub fn unwrap_body(annotation: &TypeAnnotation) -> &TypeAnnotation {
    match base_type(annotation) {
        TypeAnnotation::Body(inner) => inner,
        _ => annotation,
    }
}

/// The non-absence alternatives of an optional.
///
/// A single survivor is returned directly (borrowed); several survivors are
/// returned as a new union. Non-optional annotations are returned unchanged.
#[must_use]
pub fn unwrap_optional(annotation: &TypeAnnotation) -> Cow<'_, TypeAnnotation> {
    match base_type(annotation) {
        TypeAnnotation::Union(members) if is_optional(annotation) => {
            let rest: Vec<&TypeAnnotation> = members
                .iter()
                .filter(|m| !matches!(m, TypeAnnotation::NoneType))
                .collect();
            if rest.len() == 1 {
                Cow::Borrowed(rest[0])
            } else {
                Cow::Owned(TypeAnnotation::Union(rest.into_iter().cloned().collect()))
            }
        }
        _ => Cow::Borrowed(annotation),
    }
}

/// The element type of a list annotation.
#[must_use]
pub fn list_element(annotation: &TypeAnnotation) -> Option<&TypeAnnotation> {
    match base_type(annotation) {
        TypeAnnotation::List(element) => Some(element),
        _ => None,
    }
}

/// The record definition behind a typed-record annotation.
///
/// # Errors
///
/// `TypeMismatch` when the annotation is not a typed record.
pub fn record_of(annotation: &TypeAnnotation) -> CodecResult<&RecordDef> {
    match base_type(annotation) {
        TypeAnnotation::Record(def) => Ok(def),
        other => Err(CodecError::mismatch("typed record", other.to_string())),
    }
}

/// Member definitions of a typed record, in declaration order.
///
/// # Errors
///
/// `TypeMismatch` when the annotation is not a typed record.
pub fn members_of(annotation: &TypeAnnotation) -> CodecResult<&[MemberDef]> {
    record_of(annotation).map(|def| def.members.as_slice())
}
