//! # Codec Module
//!
//! Conversion between single wire strings and scalar [`crate::Value`]s.
//!
//! Both wire engines bottom out here: JSON strings and XML text/attributes are
//! decoded with [`decode`] against the [`crate::schema::LiteralKind`] of the
//! annotation, and scalar values are rendered back with [`encode`]. The
//! timestamp and duration forms follow a fixed ISO-8601 profile (see
//! [`parse_timestamp`] and [`parse_duration`]).
//!
//! ## Round-trip
//!
//! For every kind `k` and representable value `v`,
//! `decode(&encode(&v, k)?, k)? == v`. Timestamps keep millisecond precision
//! and their offset; durations keep millisecond precision.

mod conform;
mod iso8601;
mod scalar;

pub use conform::*;
pub use iso8601::*;
pub use scalar::*;
