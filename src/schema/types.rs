//! The annotation tree: literal kinds, records and wire metadata.

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Scalar kinds understood by the scalar codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    Boolean,
    Integer,
    Float,
    Decimal,
    Timestamp,
    Duration,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LiteralKind::String => "str",
            LiteralKind::Boolean => "bool",
            LiteralKind::Integer => "int",
            LiteralKind::Float => "float",
            LiteralKind::Decimal => "Decimal",
            LiteralKind::Timestamp => "datetime",
            LiteralKind::Duration => "timedelta",
        };
        write!(f, "{}", s)
    }
}

/// How a JSON property is shaped on the wire. Purely descriptive for the
/// engines; documentation generators use it to pick `object` / `array`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Value,
    Object,
    List,
}

/// Per-field annotation describing how a value is represented on one wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMetadata {
    /// Bare JSON value; the required marker on a JSON root.
    JsonValue,
    /// A named JSON object property.
    JsonProperty { tag: String, shape: JsonShape },
    /// An XML element; the required marker (with the element tag) on an XML root.
    XmlEntity { tag: String },
    /// An XML attribute on the enclosing element.
    XmlAttribute { tag: String },
}

/// Discriminant of [`WireMetadata`], for `has_metadata_kind` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    JsonValue,
    JsonProperty,
    XmlEntity,
    XmlAttribute,
}

impl WireMetadata {
    pub fn json_property(tag: impl Into<String>) -> Self {
        WireMetadata::JsonProperty {
            tag: tag.into(),
            shape: JsonShape::Value,
        }
    }

    pub fn json_object(tag: impl Into<String>) -> Self {
        WireMetadata::JsonProperty {
            tag: tag.into(),
            shape: JsonShape::Object,
        }
    }

    pub fn json_list(tag: impl Into<String>) -> Self {
        WireMetadata::JsonProperty {
            tag: tag.into(),
            shape: JsonShape::List,
        }
    }

    pub fn xml_entity(tag: impl Into<String>) -> Self {
        WireMetadata::XmlEntity { tag: tag.into() }
    }

    pub fn xml_attribute(tag: impl Into<String>) -> Self {
        WireMetadata::XmlAttribute { tag: tag.into() }
    }

    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        match self {
            WireMetadata::JsonValue => MetadataKind::JsonValue,
            WireMetadata::JsonProperty { .. } => MetadataKind::JsonProperty,
            WireMetadata::XmlEntity { .. } => MetadataKind::XmlEntity,
            WireMetadata::XmlAttribute { .. } => MetadataKind::XmlAttribute,
        }
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            WireMetadata::JsonValue => None,
            WireMetadata::JsonProperty { tag, .. }
            | WireMetadata::XmlEntity { tag }
            | WireMetadata::XmlAttribute { tag } => Some(tag),
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            WireMetadata::JsonValue | WireMetadata::JsonProperty { .. }
        )
    }

    #[must_use]
    pub fn is_xml(&self) -> bool {
        !self.is_json()
    }
}

/// One named member of a typed record.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    /// Internal (code-facing) member name
    pub name: String,
    /// Member type, possibly wrapped with wire metadata
    pub annotation: TypeAnnotation,
    /// Declared default; `None` means the member is required
    pub default: Option<Value>,
}

impl MemberDef {
    pub fn required(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        MemberDef {
            name: name.into(),
            annotation,
            default: None,
        }
    }

    pub fn with_default(
        name: impl Into<String>,
        annotation: TypeAnnotation,
        default: impl Into<Value>,
    ) -> Self {
        MemberDef {
            name: name.into(),
            annotation,
            default: Some(default.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A structural record whose members are known at schema-definition time.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    /// Members in declaration order
    pub members: Vec<MemberDef>,
}

impl RecordDef {
    pub fn new(name: impl Into<String>, members: Vec<MemberDef>) -> Self {
        RecordDef {
            name: name.into(),
            members,
        }
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// The schema tree walked by every engine.
///
/// Built once (by hand, through the builder functions below, or by
/// `#[derive(TypedRecord)]`) and shared read-only across requests.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    Literal(LiteralKind),
    /// The "absence" alternative of an optional
    NoneType,
    /// Alternatives in declared order; an optional is a union ending in `NoneType`
    Union(Vec<TypeAnnotation>),
    List(Box<TypeAnnotation>),
    /// Free-form mapping with renamed keys
    Dict,
    Record(Arc<RecordDef>),
    /// Marks a callable parameter as the request body
    Body(Box<TypeAnnotation>),
    /// A base type with wire metadata travelling alongside it
    Annotated(Box<TypeAnnotation>, Vec<WireMetadata>),
}

impl TypeAnnotation {
    pub fn string() -> Self {
        TypeAnnotation::Literal(LiteralKind::String)
    }

    pub fn boolean() -> Self {
        TypeAnnotation::Literal(LiteralKind::Boolean)
    }

    pub fn integer() -> Self {
        TypeAnnotation::Literal(LiteralKind::Integer)
    }

    pub fn float() -> Self {
        TypeAnnotation::Literal(LiteralKind::Float)
    }

    pub fn decimal() -> Self {
        TypeAnnotation::Literal(LiteralKind::Decimal)
    }

    pub fn timestamp() -> Self {
        TypeAnnotation::Literal(LiteralKind::Timestamp)
    }

    pub fn duration() -> Self {
        TypeAnnotation::Literal(LiteralKind::Duration)
    }

    /// `Optional[inner]`, i.e. `Union[inner, None]`.
    pub fn optional(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Union(vec![inner, TypeAnnotation::NoneType])
    }

    pub fn union(members: Vec<TypeAnnotation>) -> Self {
        TypeAnnotation::Union(members)
    }

    pub fn list(element: TypeAnnotation) -> Self {
        TypeAnnotation::List(Box::new(element))
    }

    pub fn dict() -> Self {
        TypeAnnotation::Dict
    }

    pub fn record(def: RecordDef) -> Self {
        TypeAnnotation::Record(Arc::new(def))
    }

    pub fn body(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Body(Box::new(inner))
    }

    /// Attach wire metadata. Metadata added to an already-annotated type is
    /// appended to the existing list rather than nesting another wrapper.
    #[must_use]
    pub fn with(self, metadata: WireMetadata) -> Self {
        match self {
            TypeAnnotation::Annotated(base, mut list) => {
                list.push(metadata);
                TypeAnnotation::Annotated(base, list)
            }
            base => TypeAnnotation::Annotated(Box::new(base), vec![metadata]),
        }
    }

    /// Mark as a JSON root (`JsonValue`).
    #[must_use]
    pub fn json_root(self) -> Self {
        self.with(WireMetadata::JsonValue)
    }

    /// Mark as an XML root element named `tag`.
    #[must_use]
    pub fn xml_root(self, tag: impl Into<String>) -> Self {
        self.with(WireMetadata::xml_entity(tag))
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnotation::Literal(kind) => write!(f, "{}", kind),
            TypeAnnotation::NoneType => write!(f, "None"),
            TypeAnnotation::Union(members) => {
                let optional = members.len() >= 2
                    && matches!(members.last(), Some(TypeAnnotation::NoneType));
                if optional && members.len() == 2 {
                    return write!(f, "Optional[{}]", members[0]);
                }
                write!(f, "Union[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, "]")
            }
            TypeAnnotation::List(element) => write!(f, "List[{}]", element),
            TypeAnnotation::Dict => write!(f, "Dict[str, Any]"),
            TypeAnnotation::Record(def) => write!(f, "{}", def.name),
            TypeAnnotation::Body(inner) => write!(f, "Body[{}]", inner),
            TypeAnnotation::Annotated(base, _) => write!(f, "{}", base),
        }
    }
}
