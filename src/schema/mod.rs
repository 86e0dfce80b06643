//! # Schema Module
//!
//! The schema module defines the annotation tree every engine walks: literal kinds,
//! optionals, unions, lists, free-form dictionaries and typed records, each of which
//! may carry wire metadata describing how it appears in JSON or XML.
//!
//! ## Overview
//!
//! - **[`TypeAnnotation`]** - the tagged-variant schema tree, built once at route
//!   registration time and shared read-only afterwards
//! - **[`WireMetadata`]** - JSON property tags and XML entity/attribute tags, attached
//!   alongside a base type via [`TypeAnnotation::with`]
//! - **Inspector** - predicates (`is_optional`, `is_list`, ...) and extractors
//!   (`unwrap_optional`, `members_of`, `strip_metadata`) over the tree
//! - **Validation** - [`validate_root`] / [`validate_schema`] reject malformed schemas
//!   with a `SchemaError` before any request is served
//!
//! ## Example
//!
//! ```rust
//! use brrtcodec::schema::{MemberDef, RecordDef, TypeAnnotation, WireMetadata};
//!
//! let book = TypeAnnotation::record(RecordDef::new(
//!     "Book",
//!     vec![
//!         MemberDef::required(
//!             "book_id",
//!             TypeAnnotation::integer().with(WireMetadata::json_property("bookId")),
//!         ),
//!         MemberDef::required("title", TypeAnnotation::string()),
//!         MemberDef::with_default(
//!             "pages",
//!             TypeAnnotation::optional(TypeAnnotation::integer()),
//!             brrtcodec::Value::Null,
//!         ),
//!     ],
//! ));
//!
//! assert!(brrtcodec::schema::is_typed_record(&book));
//! assert_eq!(brrtcodec::schema::members_of(&book).unwrap().len(), 3);
//! ```
//!
//! ## Optionals
//!
//! An optional is a union whose last alternative is [`TypeAnnotation::NoneType`].
//! A union with exactly one other alternative collapses to that alternative when
//! unwrapped; with several, the remainder is processed as a plain union.

mod build;
mod inspect;
mod types;

pub use build::*;
pub use inspect::*;
pub use types::*;
