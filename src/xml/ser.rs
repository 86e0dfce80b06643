use super::tree::XmlElement;
use super::{item_placement, member_placement, Placement};
use crate::codec::{conform, encode, format_duration, format_timestamp};
use crate::error::{CodecError, CodecResult};
use crate::rename::SerializerConfig;
use crate::schema::{base_type, is_optional, literal_kind, unwrap_optional, TypeAnnotation};
use crate::value::Value;
use tracing::debug;

/// Serialize `value` into `parent`, placed as `placement`.
///
/// Entities are appended as children of `parent`; attributes are set on
/// `parent` itself. `None` optionals write nothing.
///
/// # Errors
///
/// - `TypeMismatch` when the value does not fit the annotation
/// - `MissingRequiredField` when a required record member is absent
pub fn serialize_into(
    parent: &mut XmlElement,
    value: &Value,
    annotation: &TypeAnnotation,
    placement: &Placement,
    config: &SerializerConfig,
) -> CodecResult<()> {
    if let Some(kind) = literal_kind(annotation) {
        let text = encode(value, kind)?;
        match placement {
            Placement::Attribute(tag) => parent.set_attribute(tag.as_str(), text),
            Placement::Entity(tag) => {
                parent.push_child(XmlElement::new(tag.as_str()).with_text(text));
            }
        }
        return Ok(());
    }
    if is_optional(annotation) {
        if value.is_null() {
            return Ok(());
        }
        return serialize_into(parent, value, &unwrap_optional(annotation), placement, config);
    }
    match base_type(annotation) {
        TypeAnnotation::Union(alternatives) => {
            for alternative in alternatives {
                // a failed alternative may have written part of its output
                let mut trial = parent.clone();
                match serialize_into(&mut trial, value, alternative, placement, config) {
                    Ok(()) => {
                        *parent = trial;
                        return Ok(());
                    }
                    Err(e) => {
                        debug!(union = %annotation, alternative = %alternative, error = %e, "Union alternative rejected");
                    }
                }
            }
            Err(CodecError::mismatch(annotation.to_string(), value.type_name()))
        }
        TypeAnnotation::List(element) => {
            let Value::List(items) = value else {
                return Err(CodecError::mismatch(annotation.to_string(), value.type_name()));
            };
            let item = item_placement(element, placement);
            let target = if item.tag() == placement.tag() {
                parent
            } else {
                parent.push_child(XmlElement::new(placement.tag()))
            };
            for v in items {
                serialize_into(target, v, element, &item, config)?;
            }
            Ok(())
        }
        TypeAnnotation::Dict => {
            let Value::Record(_) = value else {
                return Err(CodecError::mismatch("Dict[str, Any]", value.type_name()));
            };
            write_plain(parent, placement.tag(), value, config);
            Ok(())
        }
        TypeAnnotation::Record(def) => {
            let Value::Record(members) = value else {
                return Err(CodecError::mismatch(def.name.as_str(), value.type_name()));
            };
            let mut element = XmlElement::new(placement.tag());
            for member in &def.members {
                let member_at = member_placement(member, config);
                match (members.get(&member.name), &member.default) {
                    (Some(v), _) => {
                        serialize_into(&mut element, v, &member.annotation, &member_at, config)?;
                    }
                    (None, Some(default)) => {
                        let v = conform(default.clone(), &member.annotation)?;
                        serialize_into(&mut element, &v, &member.annotation, &member_at, config)?;
                    }
                    (None, None) if is_optional(&member.annotation) => {}
                    (None, None) => return Err(CodecError::missing(member_at.tag())),
                }
            }
            parent.push_child(element);
            Ok(())
        }
        TypeAnnotation::Body(inner) => serialize_into(parent, value, inner, placement, config),
        TypeAnnotation::NoneType | TypeAnnotation::Literal(_) | TypeAnnotation::Annotated(..) => {
            Err(CodecError::mismatch(annotation.to_string(), value.type_name()))
        }
    }
}

fn plain_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::List(_) | Value::Record(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(x) => Some(x.to_string()),
        Value::Decimal(d) => Some(d.normalize().to_string()),
        Value::Timestamp(t) => Some(format_timestamp(t)),
        Value::Duration(d) => Some(format_duration(d)),
    }
}

/// Untyped writer used for `Dict` annotations. Keys pass through the
/// serialize-direction renamer; lists repeat their tag; nulls are skipped.
fn write_plain(parent: &mut XmlElement, tag: &str, value: &Value, config: &SerializerConfig) {
    match value {
        Value::Null => {}
        Value::List(items) => {
            for item in items {
                write_plain(parent, tag, item, config);
            }
        }
        Value::Record(members) => {
            let element = parent.push_child(XmlElement::new(tag));
            for (k, v) in members {
                write_plain(element, &config.external_name(k), v, config);
            }
        }
        scalar => {
            let mut element = XmlElement::new(tag);
            element.text = plain_text(scalar);
            parent.push_child(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MemberDef, RecordDef, WireMetadata};

    fn config() -> SerializerConfig {
        SerializerConfig::default()
    }

    fn render_single(holder: &XmlElement) -> String {
        assert_eq!(holder.children.len(), 1);
        holder.children[0].render().unwrap()
    }

    #[test]
    fn test_attribute_and_entities() {
        let ann = TypeAnnotation::record(RecordDef::new(
            "Book",
            vec![
                MemberDef::required(
                    "book_id",
                    TypeAnnotation::integer().with(WireMetadata::xml_attribute("bookId")),
                ),
                MemberDef::required(
                    "title",
                    TypeAnnotation::string().with(WireMetadata::xml_entity("Title")),
                ),
                MemberDef::required("page_count", TypeAnnotation::integer()),
            ],
        ));
        let value = Value::record([
            ("book_id", Value::Int(42)),
            ("title", Value::from("Dune")),
            ("page_count", Value::Int(412)),
        ]);
        let mut holder = XmlElement::new("holder");
        serialize_into(&mut holder, &value, &ann, &Placement::Entity("Book".into()), &config()).unwrap();
        assert_eq!(
            render_single(&holder),
            r#"<Book bookId="42"><Title>Dune</Title><pageCount>412</pageCount></Book>"#
        );
    }

    #[test]
    fn test_sibling_and_nested_lists() {
        let item = TypeAnnotation::string().with(WireMetadata::xml_entity("Tag"));
        let ann = TypeAnnotation::record(RecordDef::new(
            "Post",
            vec![
                MemberDef::required(
                    "tags",
                    TypeAnnotation::list(item.clone()).with(WireMetadata::xml_entity("Tag")),
                ),
                MemberDef::required(
                    "labels",
                    TypeAnnotation::list(item).with(WireMetadata::xml_entity("Labels")),
                ),
            ],
        ));
        let tags = Value::List(vec![Value::from("a"), Value::from("b")]);
        let value = Value::record([("tags", tags.clone()), ("labels", tags)]);
        let mut holder = XmlElement::new("holder");
        serialize_into(&mut holder, &value, &ann, &Placement::Entity("Post".into()), &config()).unwrap();
        assert_eq!(
            render_single(&holder),
            "<Post><Tag>a</Tag><Tag>b</Tag><Labels><Tag>a</Tag><Tag>b</Tag></Labels></Post>"
        );
    }

    #[test]
    fn test_failed_union_alternative_leaves_no_trace() {
        let partial = TypeAnnotation::record(RecordDef::new(
            "Pair",
            vec![
                MemberDef::required("first", TypeAnnotation::string()),
                MemberDef::required("second", TypeAnnotation::integer()),
            ],
        ));
        let ann = TypeAnnotation::union(vec![partial, TypeAnnotation::dict()]);
        let value = Value::record([("first", Value::from("x")), ("second", Value::from("y"))]);
        let mut holder = XmlElement::new("holder");
        serialize_into(&mut holder, &value, &ann, &Placement::Entity("Pair".into()), &config()).unwrap();
        assert_eq!(
            render_single(&holder),
            "<Pair><first>x</first><second>y</second></Pair>"
        );
    }

    #[test]
    fn test_optional_none_writes_nothing() {
        let ann = TypeAnnotation::optional(TypeAnnotation::string());
        let mut holder = XmlElement::new("holder");
        serialize_into(&mut holder, &Value::Null, &ann, &Placement::Entity("Author".into()), &config()).unwrap();
        assert!(holder.children.is_empty());
    }
}
