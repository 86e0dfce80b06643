#![allow(dead_code)]

pub mod fixtures {
    use brrtcodec::codec::parse_timestamp;
    use brrtcodec::schema::{MemberDef, RecordDef, TypeAnnotation, WireMetadata};
    use brrtcodec::Value;
    use rust_decimal::Decimal;

    /// `Author { name: str, born: Optional[datetime] }`
    pub fn author_annotation() -> TypeAnnotation {
        TypeAnnotation::record(RecordDef::new(
            "Author",
            vec![
                MemberDef::required("name", TypeAnnotation::string()),
                MemberDef::required("born", TypeAnnotation::optional(TypeAnnotation::timestamp())),
            ],
        ))
    }

    /// A book exercising attributes, renamed entities, an optional scalar, a
    /// sibling list and an optional sub-record.
    pub fn book_annotation() -> TypeAnnotation {
        TypeAnnotation::record(RecordDef::new(
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
                MemberDef::required(
                    "publication_date",
                    TypeAnnotation::timestamp().with(WireMetadata::xml_entity("PublicationDate")),
                ),
                MemberDef::required(
                    "rating",
                    TypeAnnotation::optional(TypeAnnotation::decimal())
                        .with(WireMetadata::xml_entity("Rating")),
                ),
                MemberDef::with_default(
                    "tags",
                    TypeAnnotation::list(TypeAnnotation::string())
                        .with(WireMetadata::xml_entity("Tag")),
                    Value::List(Vec::new()),
                ),
                MemberDef::required(
                    "author",
                    TypeAnnotation::optional(author_annotation())
                        .with(WireMetadata::xml_entity("Author")),
                ),
            ],
        ))
    }

    /// The book schema usable as both a JSON and an XML root.
    pub fn book_root() -> TypeAnnotation {
        book_annotation().json_root().xml_root("Book")
    }

    pub fn dune() -> Value {
        Value::record([
            ("book_id", Value::Int(42)),
            ("title", Value::from("Dune")),
            (
                "publication_date",
                Value::Timestamp(parse_timestamp("1973-01-01T21:52:13.000Z").unwrap()),
            ),
            ("rating", Value::Decimal(Decimal::new(45, 1))),
            (
                "tags",
                Value::List(vec![Value::from("sf"), Value::from("classic")]),
            ),
            (
                "author",
                Value::record([
                    ("name", Value::from("Frank Herbert")),
                    ("born", Value::Null),
                ]),
            ),
        ])
    }
}
