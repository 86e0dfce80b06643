//! Media-type dispatch: which engine reads a request body and which one writes
//! the response, keyed off `Content-Type` and `Accept`.
//!
//! | Media type | Consumes | Produces |
//! |---|---|---|
//! | `application/json` | JSON | JSON |
//! | `application/xml`, `text/xml` | XML | XML |
//! | `application/x-www-form-urlencoded` | form → JSON engine | - |
//! | `*/*` | JSON | JSON |
//!
//! `multipart/form-data` is not supported and is rejected like any other
//! unknown type.

use crate::error::{CodecError, CodecResult};
use crate::json;
use crate::rename::SerializerConfig;
use crate::schema::{validate_root, TypeAnnotation, WireFormat};
use crate::value::Value;
use crate::xml;
use serde_json::{Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const TEXT_XML: &str = "text/xml";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const ANY: &str = "*/*";

/// A parsed `type/subtype; name=value` media type. Type, subtype and parameter
/// names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub main: String,
    pub sub: String,
    pub params: Vec<(String, String)>,
}

impl MediaType {
    /// # Errors
    ///
    /// `UnsupportedMediaType` when the text has no `type/subtype` essence.
    pub fn parse(text: &str) -> CodecResult<MediaType> {
        let mut parts = text.split(';');
        let essence = parts.next().unwrap_or("").trim();
        let (main, sub) = essence
            .split_once('/')
            .filter(|(m, s)| !m.is_empty() && !s.is_empty())
            .ok_or_else(|| CodecError::UnsupportedMediaType {
                media_type: text.to_string(),
            })?;
        let params = parts
            .filter_map(|p| {
                let (k, v) = p.split_once('=')?;
                Some((
                    k.trim().to_ascii_lowercase(),
                    v.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();
        Ok(MediaType {
            main: main.trim().to_ascii_lowercase(),
            sub: sub.trim().to_ascii_lowercase(),
            params,
        })
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether this (possibly wildcard) range covers `other`.
    #[must_use]
    pub fn covers(&self, other: &MediaType) -> bool {
        (self.main == "*" || self.main == other.main) && (self.sub == "*" || self.sub == other.sub)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)?;
        for (k, v) in &self.params {
            write!(f, "; {}={}", k, v)?;
        }
        Ok(())
    }
}

/// The engine behind a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyFormat {
    Json,
    Xml,
    /// `application/x-www-form-urlencoded`, decoded through the JSON engine
    Form,
}

impl BodyFormat {
    /// The root marker a body annotation needs for this format.
    #[must_use]
    pub fn wire_format(self) -> WireFormat {
        match self {
            BodyFormat::Json | BodyFormat::Form => WireFormat::Json,
            BodyFormat::Xml => WireFormat::Xml,
        }
    }
}

/// An ordered media-type → engine table. The first entry is the default.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTable {
    entries: Vec<(MediaType, BodyFormat)>,
}

impl MediaTable {
    /// Build from `(media type, format)` pairs.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` when a media type does not parse.
    pub fn new<'a, I>(entries: I) -> CodecResult<MediaTable>
    where
        I: IntoIterator<Item = (&'a str, BodyFormat)>,
    {
        let entries = entries
            .into_iter()
            .map(|(text, format)| MediaType::parse(text).map(|m| (m, format)))
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(MediaTable { entries })
    }

    /// Request bodies the engines can read.
    #[must_use]
    pub fn consumes() -> MediaTable {
        MediaTable::builtin(&[
            ("application", "json", BodyFormat::Json),
            ("application", "xml", BodyFormat::Xml),
            ("text", "xml", BodyFormat::Xml),
            ("application", "x-www-form-urlencoded", BodyFormat::Form),
            ("*", "*", BodyFormat::Json),
        ])
    }

    /// Response bodies the engines can write.
    #[must_use]
    pub fn produces() -> MediaTable {
        MediaTable::builtin(&[
            ("application", "json", BodyFormat::Json),
            ("application", "xml", BodyFormat::Xml),
            ("text", "xml", BodyFormat::Xml),
            ("*", "*", BodyFormat::Json),
        ])
    }

    fn builtin(entries: &[(&str, &str, BodyFormat)]) -> MediaTable {
        MediaTable {
            entries: entries
                .iter()
                .map(|(main, sub, format)| {
                    (
                        MediaType {
                            main: (*main).to_string(),
                            sub: (*sub).to_string(),
                            params: Vec::new(),
                        },
                        *format,
                    )
                })
                .collect(),
        }
    }

    /// Keep only the entries named in `media_types` (exact essences), in the
    /// order given.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` for a name this table has no entry for.
    pub fn restrict<S: AsRef<str>>(&self, media_types: &[S]) -> CodecResult<MediaTable> {
        let entries = media_types
            .iter()
            .map(|name| {
                let wanted = MediaType::parse(name.as_ref())?;
                self.entries
                    .iter()
                    .find(|(m, _)| m.main == wanted.main && m.sub == wanted.sub)
                    .map(|(m, f)| (m.clone(), *f))
                    .ok_or_else(|| CodecError::UnsupportedMediaType {
                        media_type: name.as_ref().to_string(),
                    })
            })
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(MediaTable { entries })
    }

    pub fn formats(&self) -> impl Iterator<Item = BodyFormat> + '_ {
        self.entries.iter().map(|(_, f)| *f)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Engine for a request's `Content-Type`, matched exactly on the essence.
    /// A missing header selects the table's first (default) entry.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` when no entry matches.
    pub fn lookup(&self, content_type: Option<&str>) -> CodecResult<BodyFormat> {
        let Some(content_type) = content_type else {
            return self
                .formats()
                .next()
                .ok_or_else(|| CodecError::UnsupportedMediaType {
                    media_type: ANY.to_string(),
                });
        };
        let requested = MediaType::parse(content_type)?;
        self.entries
            .iter()
            .find(|(m, _)| m.main == requested.main && m.sub == requested.sub)
            .map(|(_, f)| *f)
            .ok_or_else(|| CodecError::UnsupportedMediaType {
                media_type: requested.essence(),
            })
    }

    /// Choose the response media type from an `Accept` header.
    ///
    /// Ranges are tried by descending `q` (ties keep header order); the first
    /// concrete table entry covered by a range wins. Without a header the
    /// table's first entry is used.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` when nothing acceptable is available.
    pub fn negotiate(&self, accept: Option<&str>) -> CodecResult<(String, BodyFormat)> {
        let concrete = || self.entries.iter().filter(|(m, _)| m.main != "*" && m.sub != "*");
        let ranges = match accept.map(str::trim).filter(|a| !a.is_empty()) {
            Some(header) => parse_accept(header),
            None => vec![(MediaType::parse(ANY)?, 1.0)],
        };
        for (range, q) in &ranges {
            if *q <= 0.0 {
                continue;
            }
            if let Some((m, f)) = concrete().find(|(m, _)| range.covers(m)) {
                debug!(accept = ?accept, chosen = %m, "Response media type negotiated");
                return Ok((m.essence(), *f));
            }
        }
        warn!(accept = ?accept, "No offered media type satisfies Accept");
        Err(CodecError::UnsupportedMediaType {
            media_type: accept.unwrap_or(ANY).to_string(),
        })
    }
}

/// Parse an `Accept` header into `(range, q)` pairs sorted by descending `q`.
/// Unparsable entries are skipped.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<(MediaType, f32)> {
    let mut ranges: Vec<(MediaType, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut media = MediaType::parse(entry.trim()).ok()?;
            let q = media
                .param("q")
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            media.params.retain(|(k, _)| k != "q");
            Some((media, q))
        })
        .collect();
    ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranges
}

/// Parse a query string (with or without a leading path and `?`) into
/// `name -> [values]`, keeping repeated keys in order.
#[must_use]
pub fn parse_query_string(raw: &str) -> HashMap<String, Vec<String>> {
    let query = match raw.find('?') {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    };
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        params.entry(k.into_owned()).or_default().push(v.into_owned());
    }
    params
}

/// Decode an `application/x-www-form-urlencoded` body into a JSON object whose
/// values are arrays of strings, ready for the JSON engine.
#[must_use]
pub fn parse_form(body: &[u8]) -> JsonValue {
    let mut object = Map::new();
    for (k, v) in url::form_urlencoded::parse(body) {
        let slot = object
            .entry(k.into_owned())
            .or_insert_with(|| JsonValue::Array(Vec::new()));
        if let JsonValue::Array(values) = slot {
            values.push(JsonValue::String(v.into_owned()));
        }
    }
    JsonValue::Object(object)
}

/// Decode a request body against `annotation` with the engine selected by
/// `content_type`.
///
/// # Errors
///
/// `UnsupportedMediaType` for unknown content types, `FormatError` for
/// non-UTF-8 bodies, and any error of the selected engine.
pub fn read_body(
    body: &[u8],
    content_type: Option<&str>,
    annotation: &TypeAnnotation,
    table: &MediaTable,
    config: &SerializerConfig,
) -> CodecResult<Value> {
    let format = table.lookup(content_type)?;
    debug!(content_type = ?content_type, format = ?format, bytes = body.len(), "Reading request body");
    match format {
        BodyFormat::Form => {
            validate_root(annotation, WireFormat::Json)?;
            json::deserialize(&parse_form(body), annotation, config)
        }
        BodyFormat::Json => json::from_json(utf8_body(body)?, annotation, config),
        BodyFormat::Xml => xml::from_xml(utf8_body(body)?, annotation, config),
    }
}

/// Encode a response value with the engine for `format`.
///
/// # Errors
///
/// Any error of the selected engine; `UnsupportedMediaType` for
/// [`BodyFormat::Form`], which is request-only.
pub fn write_body(
    value: &Value,
    annotation: &TypeAnnotation,
    format: BodyFormat,
    config: &SerializerConfig,
) -> CodecResult<String> {
    match format {
        BodyFormat::Json => json::to_json(value, annotation, config),
        BodyFormat::Xml => xml::to_xml(value, annotation, config),
        BodyFormat::Form => Err(CodecError::UnsupportedMediaType {
            media_type: FORM_URLENCODED.to_string(),
        }),
    }
}

fn utf8_body(body: &[u8]) -> CodecResult<&str> {
    std::str::from_utf8(body).map_err(|e| CodecError::format("UTF-8 text", e.to_string()))
}
