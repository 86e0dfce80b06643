//! # Binder Module
//!
//! Maps an HTTP request onto a handler's call arguments.
//!
//! A handler is described by a [`Signature`]: its ordered [`Parameter`]s (each
//! with a name, a [`crate::schema::TypeAnnotation`], a [`ParameterKind`] and an
//! optional default) and its return annotation. [`bind`] walks the parameters
//! in declaration order and resolves each one from, in turn:
//!
//! - the request body, for the single parameter annotated as `Body[...]`
//! - the route captures ([`PathParams`], usually a [`ParamVec`])
//! - the parsed query string (`name -> [values]`)
//! - the parameter's declared default
//! - `None`, for optional parameters
//!
//! Anything else is a `MissingRequiredField` and aborts the whole request.
//!
//! Parameter names are looked up on the wire through the serialize-direction
//! renamer, so a `book_id` parameter reads the `bookId` capture or query key
//! under the default configuration. Keyword arguments are stored under the
//! original name.
//!
//! ## Example
//!
//! ```rust
//! use brrtcodec::binder::{bind, Parameter, ParamVec, Signature};
//! use brrtcodec::schema::TypeAnnotation;
//! use brrtcodec::{CodecResult, SerializerConfig, Value};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let signature = Signature::new(
//!     "get_book",
//!     vec![
//!         Parameter::positional("book_id", TypeAnnotation::integer()),
//!         Parameter::keyword("verbose", TypeAnnotation::boolean()).with_default(false),
//!     ],
//!     TypeAnnotation::string().json_root(),
//! );
//!
//! let mut matches = ParamVec::new();
//! matches.push((Arc::from("bookId"), "42".to_string()));
//! let query: HashMap<String, Vec<String>> = HashMap::new();
//! let no_body = |_: TypeAnnotation| async { CodecResult::Ok(Value::Null) };
//!
//! let bound = futures::executor::block_on(bind(
//!     &signature,
//!     &matches,
//!     &query,
//!     no_body,
//!     &SerializerConfig::default(),
//! ))
//! .unwrap();
//! assert_eq!(bound.args, vec![Value::Int(42)]);
//! assert_eq!(bound.kwargs.get("verbose"), Some(&Value::Bool(false)));
//! ```
//!
//! ## Body reading
//!
//! The body reader is an `FnOnce` returning a future. It is only invoked when
//! the signature has a body parameter, so requests without one never touch the
//! request stream.

mod core;

pub use core::*;
