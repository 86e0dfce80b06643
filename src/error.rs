use http::StatusCode;
use std::fmt;

/// Failure raised while converting between wire text and [`crate::Value`]s.
///
/// Every variant except [`CodecError::Schema`] is request-local: it aborts the
/// current argument or response and is surfaced to the HTTP layer as a client
/// (or, after the handler ran, a server) error. `Schema` is raised while a route
/// is being registered and keeps that route from ever receiving traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The schema itself is malformed (e.g. a root annotation without its
    /// `JsonValue` / `XmlEntity` marker).
    Schema {
        /// What is wrong with the schema
        message: String,
    },
    /// The annotation shape is not handled for this value, or every alternative
    /// of a union rejected it.
    TypeMismatch {
        /// The annotation that could not be satisfied
        expected: String,
        /// What was found instead
        found: String,
    },
    /// Scalar text does not match the expected textual profile.
    Format {
        /// The literal kind being decoded
        kind: String,
        /// The offending text
        text: String,
    },
    /// A record member or callable parameter has no wire value and no default.
    MissingRequiredField {
        /// The external (wire) name that was looked up
        key: String,
    },
    /// An XML attribute required by the schema is absent from its element.
    Attribute {
        /// The attribute name
        name: String,
        /// The element it was expected on
        element: String,
    },
    /// No deserializer/serializer is registered for the negotiated media type.
    UnsupportedMediaType {
        /// The media type that was requested
        media_type: String,
    },
}

impl CodecError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        CodecError::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn format(kind: impl Into<String>, text: impl Into<String>) -> Self {
        CodecError::Format {
            kind: kind.into(),
            text: text.into(),
        }
    }

    pub(crate) fn missing(key: impl Into<String>) -> Self {
        CodecError::MissingRequiredField { key: key.into() }
    }

    /// Short machine-readable name of the error kind, used in problem bodies and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            CodecError::Schema { .. } => "SchemaError",
            CodecError::TypeMismatch { .. } => "TypeMismatch",
            CodecError::Format { .. } => "FormatError",
            CodecError::MissingRequiredField { .. } => "MissingRequiredField",
            CodecError::Attribute { .. } => "AttributeError",
            CodecError::UnsupportedMediaType { .. } => "UnsupportedMediaType",
        }
    }

    /// HTTP status for a failure raised while binding a request.
    ///
    /// Schema errors are server-side defects and map to 500; unknown media
    /// types map to 415; everything else is the client's fault.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            CodecError::Schema { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CodecError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// HTTP status for a failure raised while rendering a handler's return value.
    ///
    /// The handler already ran, so anything but an unacceptable `Accept`
    /// header (406) is a server error.
    #[must_use]
    pub fn response_status(&self) -> StatusCode {
        match self {
            CodecError::UnsupportedMediaType { .. } => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON problem body for the HTTP layer.
    #[must_use]
    pub fn to_problem(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        })
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Schema { message } => write!(f, "schema error: {}", message),
            CodecError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            CodecError::Format { kind, text } => {
                write!(f, "unable to convert '{}' to {}", text, kind)
            }
            CodecError::MissingRequiredField { key } => {
                write!(f, "required key \"{}\" is missing", key)
            }
            CodecError::Attribute { name, element } => {
                write!(f, "expected attribute \"{}\" on element <{}>", name, element)
            }
            CodecError::UnsupportedMediaType { media_type } => {
                write!(f, "unsupported media type '{}'", media_type)
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Convenience alias used throughout the engines.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(CodecError::missing("bookId").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CodecError::schema("no root").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CodecError::UnsupportedMediaType {
                media_type: "text/csv".into()
            }
            .status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_response_status_mapping() {
        assert_eq!(
            CodecError::missing("title").response_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CodecError::UnsupportedMediaType {
                media_type: "image/png".into()
            }
            .response_status(),
            StatusCode::NOT_ACCEPTABLE
        );
    }

    #[test]
    fn test_problem_body() {
        let problem = CodecError::missing("bookId").to_problem();
        assert_eq!(problem["error"], "MissingRequiredField");
        assert_eq!(problem["message"], "required key \"bookId\" is missing");
    }
}
