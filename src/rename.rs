//! Field-name conventions applied between internal member names and wire keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A pure string-to-string function converting between naming conventions.
pub type Renamer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Built-in naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    /// Leave names untouched
    #[default]
    Identity,
    /// `book_id`
    Snake,
    /// `bookId`
    Camel,
    /// `BookId`
    Pascal,
}

impl Case {
    /// Apply this convention to `name`.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Case::Identity => name.to_string(),
            Case::Snake => to_snake_case(name),
            Case::Camel => to_camel_case(name),
            Case::Pascal => to_pascal_case(name),
        }
    }

    /// The convention as a [`Renamer`] value.
    #[must_use]
    pub fn renamer(self) -> Renamer {
        Arc::new(move |name: &str| self.apply(name))
    }
}

fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in s.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// `bookId` / `BookId` / `book-id` → `book_id`
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `book_id` / `BookId` → `bookId`
#[must_use]
pub fn to_camel_case(s: &str) -> String {
    words(s)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
        .collect()
}

/// `book_id` / `bookId` → `BookId`
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    words(s).iter().map(|w| capitalize(w)).collect()
}

/// The pair of renamers threaded through every engine call.
///
/// `serialize_key` maps an internal member name to its wire key; it is used both
/// when writing and when looking a record member up while reading, so the two
/// directions agree on key casing. `deserialize_key` maps wire keys of free-form
/// dictionaries back to internal names.
#[derive(Clone)]
pub struct SerializerConfig {
    pub serialize_key: Renamer,
    pub deserialize_key: Renamer,
}

impl SerializerConfig {
    pub fn new(serialize_key: Renamer, deserialize_key: Renamer) -> Self {
        SerializerConfig {
            serialize_key,
            deserialize_key,
        }
    }

    /// Build from two built-in conventions: `external` for wire keys and
    /// `internal` for code-facing names.
    #[must_use]
    pub fn from_cases(external: Case, internal: Case) -> Self {
        SerializerConfig::new(external.renamer(), internal.renamer())
    }

    /// Wire key of an internal member name.
    #[inline]
    #[must_use]
    pub fn external_name(&self, name: &str) -> String {
        (self.serialize_key)(name)
    }

    /// Internal name of a wire key.
    #[inline]
    #[must_use]
    pub fn internal_name(&self, key: &str) -> String {
        (self.deserialize_key)(key)
    }
}

impl Default for SerializerConfig {
    /// camelCase on the wire, snake_case in code.
    fn default() -> Self {
        SerializerConfig::from_cases(Case::Camel, Case::Snake)
    }
}

impl fmt::Debug for SerializerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerConfig").finish_non_exhaustive()
    }
}
