//! # Config Module
//!
//! Codec configuration loaded from YAML (or JSON) files.
//!
//! ## Example Configuration
//!
//! ```yaml
//! serialize_case: camel        # wire keys: bookId
//! deserialize_case: snake      # dictionary keys in code: book_id
//! default_media_type: application/json
//! consumes:
//!   - application/json
//!   - application/xml
//! produces:
//!   - application/json
//! ```
//!
//! Every field is optional; see [`CodecConfig::default`].

use crate::error::CodecResult;
use crate::media::{MediaTable, APPLICATION_JSON, APPLICATION_XML, FORM_URLENCODED, TEXT_XML};
use crate::rename::{Case, SerializerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Convention for wire keys derived from member and parameter names
    pub serialize_case: Case,
    /// Convention for free-form dictionary keys read from the wire
    pub deserialize_case: Case,
    /// Media type used for responses when the request has no `Accept` header
    pub default_media_type: String,
    /// Request body media types accepted by routes that do not declare their own
    pub consumes: Vec<String>,
    /// Response media types offered by routes that do not declare their own
    pub produces: Vec<String>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            serialize_case: Case::Camel,
            deserialize_case: Case::Snake,
            default_media_type: APPLICATION_JSON.to_string(),
            consumes: vec![
                APPLICATION_JSON.to_string(),
                APPLICATION_XML.to_string(),
                TEXT_XML.to_string(),
                FORM_URLENCODED.to_string(),
            ],
            produces: vec![
                APPLICATION_JSON.to_string(),
                APPLICATION_XML.to_string(),
                TEXT_XML.to_string(),
            ],
        }
    }
}

impl CodecConfig {
    /// Parse a YAML document. JSON is valid YAML, so JSON text works too.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or names an unknown field.
    pub fn from_yaml_str(text: &str) -> anyhow::Result<CodecConfig> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// The renamer pair threaded through the engines.
    #[must_use]
    pub fn serializer_config(&self) -> SerializerConfig {
        SerializerConfig::from_cases(self.serialize_case, self.deserialize_case)
    }

    /// Request body table restricted to [`CodecConfig::consumes`].
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` for a media type no engine reads.
    pub fn consumes_table(&self) -> CodecResult<MediaTable> {
        MediaTable::consumes().restrict(self.consumes.as_slice())
    }

    /// Response table restricted to [`CodecConfig::produces`], with
    /// [`CodecConfig::default_media_type`] moved to the front.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` for a media type no engine writes.
    pub fn produces_table(&self) -> CodecResult<MediaTable> {
        let mut ordered = vec![self.default_media_type.clone()];
        ordered.extend(
            self.produces
                .iter()
                .filter(|m| **m != self.default_media_type)
                .cloned(),
        );
        MediaTable::produces().restrict(ordered.as_slice())
    }
}

/// Load a [`CodecConfig`] from a `.yaml`/`.yml` or `.json` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<CodecConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let config: CodecConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    info!(
        path = %path.display(),
        serialize_case = ?config.serialize_case,
        deserialize_case = ?config.deserialize_case,
        default_media_type = %config.default_media_type,
        "Codec configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::BodyFormat;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.serializer_config().external_name("book_id"), "bookId");
    }

    #[test]
    fn test_partial_yaml() {
        let config = CodecConfig::from_yaml_str("serialize_case: pascal\n").unwrap();
        assert_eq!(config.serialize_case, Case::Pascal);
        assert_eq!(config.deserialize_case, Case::Snake);
        assert_eq!(config.serializer_config().external_name("book_id"), "BookId");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(CodecConfig::from_yaml_str("serialise_case: camel\n").is_err());
    }

    #[test]
    fn test_default_media_type_leads_produces() {
        let config = CodecConfig {
            default_media_type: APPLICATION_XML.to_string(),
            ..CodecConfig::default()
        };
        let (chosen, format) = config.produces_table().unwrap().negotiate(None).unwrap();
        assert_eq!(chosen, APPLICATION_XML);
        assert_eq!(format, BodyFormat::Xml);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "serialize_case: snake\nconsumes: [application/json]").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.serialize_case, Case::Snake);
        assert_eq!(config.consumes, vec![APPLICATION_JSON.to_string()]);
        assert!(config.consumes_table().unwrap().lookup(Some(APPLICATION_XML)).is_err());
    }
}
