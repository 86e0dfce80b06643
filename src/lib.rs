//! # brrtcodec
//!
//! **brrtcodec** is the annotation-driven serialization core of a REST router: it turns
//! JSON and XML request bodies, path captures and query strings into typed handler
//! arguments, and turns handler return values back into JSON or XML responses.
//!
//! ## Overview
//!
//! Every engine walks a [`schema::TypeAnnotation`], a plain tagged tree built once when a
//! route is registered (by hand, or with `#[derive(TypedRecord)]`). Per-request work only
//! walks that tree; nothing is re-inspected while serving traffic.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`schema`]** - Type annotations, wire metadata, the annotation inspector and
//!   setup-time schema validation
//! - **[`value`]** - The dynamic [`Value`] tree produced and consumed by the engines
//! - **[`codec`]** - Scalar text codec (decimals, ISO-8601 timestamps and durations)
//! - **[`rename`]** - Naming conventions between member names and wire keys
//! - **[`json`]** - JSON deserialization and serialization engines
//! - **[`xml`]** - XML element tree and the deserialization and serialization engines
//! - **[`binder`]** - Maps path captures, query values and bodies onto a handler signature
//! - **[`media`]** - Content-Type dispatch, `Accept` negotiation, form and query decoding
//! - **[`registry`]** - Route registration with all schema checks done up front
//! - **[`typed`]** - The [`typed::Typed`] bridge between Rust types and values
//! - **[`config`]** - YAML-loaded codec configuration
//! - **[`error`]** - The [`CodecError`] taxonomy and its HTTP status mapping
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Router
//!     participant Route as registry::Route
//!     participant Binder as binder::bind
//!     participant Media as media::read_body
//!     participant Engine as json / xml engine
//!     participant Handler
//!
//!     Router->>Route: bind_request(captures, query, content type, body)
//!     Route->>Binder: signature, captures, parsed query
//!     loop each parameter
//!         alt body parameter
//!             Binder->>Media: body annotation
//!             Media->>Engine: from_json / from_xml / form
//!             Engine-->>Binder: Value
//!         else capture or query value
//!             Binder->>Engine: deserialize(string node)
//!             Engine-->>Binder: Value
//!         else absent
//!             Binder->>Binder: default, None, or MissingRequiredField
//!         end
//!     end
//!     Binder-->>Router: BoundArguments
//!     Router->>Handler: call(args, kwargs)
//!     Handler-->>Router: return Value
//!     Router->>Route: render_response(value, Accept)
//!     Route->>Engine: to_json / to_xml
//!     Route-->>Router: (content type, text)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtcodec::schema::{MemberDef, RecordDef, TypeAnnotation, WireMetadata};
//! use brrtcodec::{json, xml, SerializerConfig, Value};
//!
//! let book = TypeAnnotation::record(RecordDef::new(
//!     "Book",
//!     vec![
//!         MemberDef::required(
//!             "book_id",
//!             TypeAnnotation::integer().with(WireMetadata::xml_attribute("id")),
//!         ),
//!         MemberDef::required("title", TypeAnnotation::string()),
//!     ],
//! ));
//! let root = book.json_root().xml_root("Book");
//! let config = SerializerConfig::default();
//!
//! let value = json::from_json(r#"{"bookId": 7, "title": "Dune"}"#, &root, &config).unwrap();
//! assert_eq!(value.get("book_id"), Some(&Value::Int(7)));
//!
//! let text = xml::to_xml(&value, &root, &config).unwrap();
//! assert_eq!(text, r#"<Book id="7"><title>Dune</title></Book>"#);
//! ```
//!
//! ## Error Handling
//!
//! Schema problems are reported as [`CodecError::Schema`] when a route is registered, so
//! a misdeclared route never serves traffic. Everything else is request-local:
//! [`CodecError::status`] maps binding failures to 400 (or 415), and
//! [`CodecError::response_status`] maps rendering failures to 500 (or 406).
//!
//! ## Logging
//!
//! The crate emits `tracing` events (rejected union alternatives, binder resolution
//! sources, negotiation outcomes, route registration) and never installs a subscriber.

extern crate self as brrtcodec;

pub mod binder;
pub mod codec;
pub mod config;
pub mod error;
pub mod json;
pub mod media;
pub mod registry;
pub mod rename;
pub mod schema;
pub mod typed;
pub mod value;
pub mod xml;

pub use binder::{bind, BoundArguments, ParamVec, Parameter, ParameterKind, PathParams, Signature};
pub use brrtcodec_macros::TypedRecord;
pub use config::{load_config, CodecConfig};
pub use error::{CodecError, CodecResult};
pub use media::{BodyFormat, MediaTable, MediaType};
pub use registry::{Route, RouteRegistry, RouteSpec};
pub use rename::{Case, Renamer, SerializerConfig};
pub use typed::Typed;
pub use value::Value;
