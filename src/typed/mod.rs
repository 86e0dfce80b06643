//! # Typed Module
//!
//! Bridges concrete Rust types to the dynamic [`crate::Value`] tree and the
//! [`crate::schema::TypeAnnotation`] describing them.
//!
//! ## Overview
//!
//! Handlers usually want plain structs rather than [`crate::Value`] records.
//! The [`Typed`] trait gives a type three things:
//!
//! - **Annotation** - the schema the engines walk for this type
//! - **`to_value`** - conversion into the value tree before serialization
//! - **`from_value`** - conversion out of the value tree after deserialization
//!
//! Scalars, `Option<T>` and `Vec<T>` are covered here. Structs get an
//! implementation from `#[derive(TypedRecord)]`, which builds the record schema
//! once and caches it.
//!
//! ## Usage
//!
//! ```rust
//! use brrtcodec::typed::{self, Typed};
//! use brrtcodec::{SerializerConfig, TypedRecord};
//!
//! #[derive(Debug, PartialEq, TypedRecord)]
//! #[record(name = "Book")]
//! struct Book {
//!     #[wire(xml_attribute = "id")]
//!     book_id: i64,
//!     title: String,
//!     #[wire(default)]
//!     subtitle: Option<String>,
//! }
//!
//! let config = SerializerConfig::default();
//! let book = Book { book_id: 7, title: "Dune".into(), subtitle: None };
//!
//! let json = typed::to_json(&book, &config).unwrap();
//! assert_eq!(json, r#"{"bookId":7,"subtitle":null,"title":"Dune"}"#);
//!
//! let xml = typed::to_xml(&book, "Book", &config).unwrap();
//! assert_eq!(xml, r#"<Book id="7"><title>Dune</title></Book>"#);
//! assert_eq!(typed::from_xml::<Book>(&xml, "Book", &config).unwrap(), book);
//! ```
//!
//! ## Field attributes
//!
//! - `#[wire(json = "key")]` - explicit JSON property tag
//! - `#[wire(xml_entity = "Tag")]` - child element tag
//! - `#[wire(xml_attribute = "name")]` - attribute on the record's element
//! - `#[wire(default)]` - absent on the wire means `Default::default()`

mod core;

pub use core::*;
