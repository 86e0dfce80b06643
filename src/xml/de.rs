use super::tree::XmlElement;
use super::{item_placement, member_placement, Placement};
use crate::codec::{absent_member, decode};
use crate::error::{CodecError, CodecResult};
use crate::rename::SerializerConfig;
use crate::schema::{base_type, is_optional, literal_kind, unwrap_optional, LiteralKind, TypeAnnotation};
use crate::value::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Position of the engine in the element tree.
///
/// `element` is the element holding the value (or, for attributes, the element
/// carrying the attribute); `parent` is needed to iterate sibling lists.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    pub parent: Option<&'a XmlElement>,
    pub element: &'a XmlElement,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn root(element: &'a XmlElement) -> Self {
        Cursor {
            parent: None,
            element,
        }
    }

    fn child(self, element: &'a XmlElement) -> Self {
        Cursor {
            parent: Some(self.element),
            element,
        }
    }
}

/// XML emptiness test for optionals: an attribute is empty when absent, an
/// entity when it has no text, no children and no attributes.
#[must_use]
pub fn is_empty_at(cursor: Cursor<'_>, placement: &Placement) -> bool {
    match placement {
        Placement::Attribute(tag) => cursor.element.attribute(tag).is_none(),
        Placement::Entity(_) => cursor.element.is_empty(),
    }
}

/// Deserialize the value at `cursor` against `annotation`, placed as
/// `placement`.
///
/// # Errors
///
/// - `TypeMismatch` for unhandled shapes or exhausted unions
/// - `FormatError` for undecodable text
/// - `MissingRequiredField` for absent member elements
/// - `AttributeError` for absent required attributes
pub fn deserialize(
    cursor: Cursor<'_>,
    annotation: &TypeAnnotation,
    placement: &Placement,
    config: &SerializerConfig,
) -> CodecResult<Value> {
    if let Some(kind) = literal_kind(annotation) {
        return decode_literal(cursor, kind, placement);
    }
    if is_optional(annotation) {
        if is_empty_at(cursor, placement) {
            return Ok(Value::Null);
        }
        return deserialize(cursor, &unwrap_optional(annotation), placement, config);
    }
    match base_type(annotation) {
        TypeAnnotation::Union(alternatives) => {
            for alternative in alternatives {
                match deserialize(cursor, alternative, placement, config) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        debug!(union = %annotation, alternative = %alternative, error = %e, "Union alternative rejected");
                    }
                }
            }
            Err(CodecError::mismatch(
                annotation.to_string(),
                format!("<{}>", cursor.element.tag),
            ))
        }
        TypeAnnotation::List(element) => {
            let item = item_placement(element, placement);
            let items: Vec<&XmlElement> = if item.tag() == placement.tag() {
                match cursor.parent {
                    Some(parent) => parent.children_named(item.tag()).collect(),
                    None => vec![cursor.element],
                }
            } else {
                cursor.element.descendants_named(item.tag())
            };
            items
                .into_iter()
                .map(|e| deserialize(cursor.child(e), element, &item, config))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::List)
        }
        TypeAnnotation::Dict => Ok(plain_value(cursor.element, config)),
        TypeAnnotation::Record(def) => {
            let mut record = BTreeMap::new();
            for member in &def.members {
                let member_at = member_placement(member, config);
                let value = match &member_at {
                    Placement::Attribute(tag) => {
                        if cursor.element.attribute(tag).is_some() {
                            deserialize(cursor, &member.annotation, &member_at, config)?
                        } else {
                            absent_member(member, tag).map_err(|e| match e {
                                CodecError::MissingRequiredField { key } => CodecError::Attribute {
                                    name: key,
                                    element: cursor.element.tag.clone(),
                                },
                                other => other,
                            })?
                        }
                    }
                    Placement::Entity(tag) => match cursor.element.child(tag) {
                        Some(child) => {
                            deserialize(cursor.child(child), &member.annotation, &member_at, config)?
                        }
                        None => absent_member(member, tag)?,
                    },
                };
                record.insert(member.name.clone(), value);
            }
            Ok(Value::Record(record))
        }
        TypeAnnotation::Body(inner) => deserialize(cursor, inner, placement, config),
        TypeAnnotation::NoneType | TypeAnnotation::Literal(_) | TypeAnnotation::Annotated(..) => {
            Err(CodecError::mismatch(
                annotation.to_string(),
                format!("<{}>", cursor.element.tag),
            ))
        }
    }
}

fn decode_literal(cursor: Cursor<'_>, kind: LiteralKind, placement: &Placement) -> CodecResult<Value> {
    let text = match placement {
        Placement::Attribute(tag) => cursor.element.attribute(tag).ok_or_else(|| {
            CodecError::Attribute {
                name: tag.clone(),
                element: cursor.element.tag.clone(),
            }
        })?,
        Placement::Entity(_) => match (&cursor.element.text, kind) {
            (Some(text), _) => text.as_str(),
            // `<Title/>` is the empty string
            (None, LiteralKind::String) => "",
            (None, kind) => return Err(CodecError::format(kind.to_string(), "")),
        },
    };
    decode(text, kind)
}

/// Untyped conversion used for `Dict` annotations: attributes and leaf
/// children become strings, repeated tags become lists, and every name passes
/// through the deserialize-direction renamer.
fn plain_value(element: &XmlElement, config: &SerializerConfig) -> Value {
    if element.children.is_empty() && element.attributes.is_empty() {
        return Value::String(element.text.clone().unwrap_or_default());
    }
    let mut members: BTreeMap<String, Value> = BTreeMap::new();
    for (k, v) in &element.attributes {
        members.insert(config.internal_name(k), Value::String(v.clone()));
    }
    for child in &element.children {
        let key = config.internal_name(&child.tag);
        let value = plain_value(child, config);
        match members.remove(&key) {
            Some(Value::List(mut items)) => {
                items.push(value);
                members.insert(key, Value::List(items));
            }
            Some(previous) => {
                members.insert(key, Value::List(vec![previous, value]));
            }
            None => {
                members.insert(key, value);
            }
        }
    }
    Value::Record(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MemberDef, RecordDef, WireMetadata};

    fn config() -> SerializerConfig {
        SerializerConfig::default()
    }

    fn parse(text: &str) -> XmlElement {
        XmlElement::parse(text).unwrap()
    }

    #[test]
    fn test_sibling_list_iterates_parent_children() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Shelf",
            vec![MemberDef::required(
                "books",
                TypeAnnotation::list(TypeAnnotation::string().with(WireMetadata::xml_entity("Book")))
                    .with(WireMetadata::xml_entity("Book")),
            )],
        ));
        let doc = parse("<Shelf><Book>A</Book><Other/><Book>B</Book></Shelf>");
        let value = deserialize(Cursor::root(&doc), &ann, &Placement::Entity("Shelf".into()), &config()).unwrap();
        assert_eq!(
            value.get("books"),
            Some(&Value::List(vec![Value::from("A"), Value::from("B")]))
        );
    }

    #[test]
    fn test_nested_list_iterates_wrapper_descendants() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Shelf",
            vec![MemberDef::required(
                "books",
                TypeAnnotation::list(TypeAnnotation::string().with(WireMetadata::xml_entity("Book")))
                    .with(WireMetadata::xml_entity("Books")),
            )],
        ));
        let doc = parse("<Shelf><Book>stray</Book><Books><Book>A</Book><Book>B</Book></Books></Shelf>");
        let value = deserialize(Cursor::root(&doc), &ann, &Placement::Entity("Shelf".into()), &config()).unwrap();
        assert_eq!(
            value.get("books"),
            Some(&Value::List(vec![Value::from("A"), Value::from("B")]))
        );
    }

    #[test]
    fn test_missing_attribute_is_attribute_error() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Book",
            vec![MemberDef::required(
                "book_id",
                TypeAnnotation::integer().with(WireMetadata::xml_attribute("bookId")),
            )],
        ));
        let doc = parse("<Book/>");
        let err = deserialize(Cursor::root(&doc), &ann, &Placement::Entity("Book".into()), &config()).unwrap_err();
        assert_eq!(err.kind(), "AttributeError");
    }

    #[test]
    fn test_missing_entity_is_missing_field() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Book",
            vec![MemberDef::required(
                "title",
                TypeAnnotation::string().with(WireMetadata::xml_entity("Title")),
            )],
        ));
        let doc = parse("<Book/>");
        let err = deserialize(Cursor::root(&doc), &ann, &Placement::Entity("Book".into()), &config()).unwrap_err();
        assert_eq!(err, CodecError::missing("Title"));
    }

    #[test]
    fn test_optional_empty_element_is_null() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Book",
            vec![MemberDef::required(
                "author",
                TypeAnnotation::optional(TypeAnnotation::string()).with(WireMetadata::xml_entity("Author")),
            )],
        ));
        let doc = parse("<Book><Author/></Book>");
        let value = deserialize(Cursor::root(&doc), &ann, &Placement::Entity("Book".into()), &config()).unwrap();
        assert_eq!(value.get("author"), Some(&Value::Null));
    }

    #[test]
    fn test_dict_collects_repeated_tags() {
        let doc = parse(r#"<Extra kind="x"><Tag>a</Tag><Tag>b</Tag><SubTitle>s</SubTitle></Extra>"#);
        let value = plain_value(&doc, &config());
        assert_eq!(value.get("kind"), Some(&Value::from("x")));
        assert_eq!(value.get("sub_title"), Some(&Value::from("s")));
        assert_eq!(
            value.get("tag"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }
}
