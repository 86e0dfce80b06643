//! # XML Module
//!
//! Typed deserialization and serialization between XML text and [`Value`]s.
//!
//! Every value is written at a [`Placement`]: either a child element with a
//! tag, or an attribute on the enclosing element. Record members take their
//! placement from their `XmlEntity` / `XmlAttribute` metadata; a member without
//! XML metadata becomes a child element named by the serialize-direction
//! renamer.
//!
//! ## Lists: siblings or nested
//!
//! A list's items take the placement of the element annotation when it carries
//! XML metadata, else the list's own. When the item tag equals the list tag the
//! items are written as siblings directly into the enclosing element:
//!
//! ```xml
//! <Post><Tag>a</Tag><Tag>b</Tag></Post>
//! ```
//!
//! Otherwise they are nested under a wrapper element named by the list tag:
//!
//! ```xml
//! <Post><Tags><Tag>a</Tag><Tag>b</Tag></Tags></Post>
//! ```
//!
//! Reading mirrors this: sibling items are collected from the parent's
//! children, nested items from the wrapper's descendants.

mod de;
mod ser;
mod tree;

pub use de::{deserialize, is_empty_at, Cursor};
pub use ser::serialize_into;
pub use tree::XmlElement;

use crate::error::{CodecError, CodecResult};
use crate::rename::SerializerConfig;
use crate::schema::{xml_metadata, xml_root_tag, MemberDef, TypeAnnotation, WireMetadata};
use crate::value::Value;
use tracing::debug;

/// Where a value lives relative to its enclosing element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// A child element with this tag
    Entity(String),
    /// An attribute with this name on the enclosing element
    Attribute(String),
}

impl Placement {
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Placement::Entity(tag) | Placement::Attribute(tag) => tag,
        }
    }

    /// Placement declared by an annotation's XML metadata, if any.
    #[must_use]
    pub fn of(annotation: &TypeAnnotation) -> Option<Placement> {
        match xml_metadata(annotation) {
            Some(WireMetadata::XmlEntity { tag }) => Some(Placement::Entity(tag.clone())),
            Some(WireMetadata::XmlAttribute { tag }) => Some(Placement::Attribute(tag.clone())),
            _ => None,
        }
    }
}

pub(crate) fn member_placement(member: &MemberDef, config: &SerializerConfig) -> Placement {
    Placement::of(&member.annotation)
        .unwrap_or_else(|| Placement::Entity(config.external_name(&member.name)))
}

pub(crate) fn item_placement(element: &TypeAnnotation, list: &Placement) -> Placement {
    Placement::of(element).unwrap_or_else(|| list.clone())
}

/// Parse XML text and deserialize it against a root annotation.
///
/// # Errors
///
/// `SchemaError` when `root` lacks an `XmlEntity` marker, `FormatError` for
/// malformed XML, and any error of [`deserialize`].
pub fn from_xml(text: &str, root: &TypeAnnotation, config: &SerializerConfig) -> CodecResult<Value> {
    let tag = xml_root_tag(root)?;
    let document = XmlElement::parse(text)?;
    debug!(annotation = %root, root_tag = %tag, element = %document.tag, "Deserializing XML payload");
    deserialize(
        Cursor::root(&document),
        root,
        &Placement::Entity(tag.to_string()),
        config,
    )
}

/// Serialize a value against a root annotation and render single-line XML text.
///
/// # Errors
///
/// `SchemaError` when `root` lacks an `XmlEntity` marker, `TypeMismatch` when
/// the value does not produce exactly one root element, and any error of
/// [`serialize_into`].
pub fn to_xml(value: &Value, root: &TypeAnnotation, config: &SerializerConfig) -> CodecResult<String> {
    let tag = xml_root_tag(root)?;
    let mut holder = XmlElement::new("#document");
    serialize_into(
        &mut holder,
        value,
        root,
        &Placement::Entity(tag.to_string()),
        config,
    )?;
    match holder.children.as_slice() {
        [element] => element.render(),
        other => Err(CodecError::mismatch(
            format!("a single <{}> root element", tag),
            format!("{} elements", other.len()),
        )),
    }
}
