//! Route registration: the surface the router hands handler signatures to.
//!
//! Every check that depends only on the route's declaration runs once, in
//! [`RouteRegistry::register`]. A route whose schema cannot be served in one
//! of its media types fails with a `SchemaError` and never receives traffic;
//! a registered [`Route`] only reports request-local errors afterwards.

use crate::binder::{bind, BoundArguments, PathParams, Signature};
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::media::{self, BodyFormat, MediaTable};
use crate::rename::SerializerConfig;
use crate::schema::{unwrap_body, validate_root, TypeAnnotation};
use crate::value::Value;
use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};

/// A route as declared by the application.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    /// Path pattern as the router knows it (e.g. `/books/{bookId}`)
    pub path: String,
    pub signature: Signature,
    /// Accepted request media types; empty means the configured defaults
    pub consumes: Vec<String>,
    /// Offered response media types; empty means the configured defaults
    pub produces: Vec<String>,
    /// Status of a successful response
    pub status: StatusCode,
}

impl RouteSpec {
    pub fn new(method: Method, path: impl Into<String>, signature: Signature) -> Self {
        RouteSpec {
            method,
            path: path.into(),
            signature,
            consumes: Vec::new(),
            produces: Vec::new(),
            status: StatusCode::OK,
        }
    }

    #[must_use]
    pub fn consumes<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = media_types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn produces<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = media_types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

/// A validated route, ready to bind requests and render responses.
pub struct Route {
    spec: RouteSpec,
    consumes: MediaTable,
    produces: MediaTable,
    config: SerializerConfig,
}

impl Route {
    #[must_use]
    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.spec.signature
    }

    #[must_use]
    pub fn consumes(&self) -> &MediaTable {
        &self.consumes
    }

    #[must_use]
    pub fn produces(&self) -> &MediaTable {
        &self.produces
    }

    /// Bind one request to the route's signature.
    ///
    /// # Arguments
    ///
    /// * `route_matches` - Path captures from the router
    /// * `raw_query` - Query string, with or without the leading path and `?`
    /// * `content_type` - The request's `Content-Type` header, if any
    /// * `body` - Raw body bytes; only read when the signature has a body parameter
    ///
    /// # Errors
    ///
    /// Any binding error; map it with [`CodecError::status`] (400 or 415).
    pub async fn bind_request<M>(
        &self,
        route_matches: &M,
        raw_query: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> CodecResult<BoundArguments>
    where
        M: PathParams + ?Sized,
    {
        let query = media::parse_query_string(raw_query);
        let table = &self.consumes;
        let config = &self.config;
        let body_reader = move |annotation: TypeAnnotation| async move {
            media::read_body(body, content_type, &annotation, table, config)
        };
        let bound = bind(&self.spec.signature, route_matches, &query, body_reader, config).await;
        if let Err(e) = &bound {
            debug!(
                method = %self.spec.method,
                path = %self.spec.path,
                error = %e,
                status = e.status().as_u16(),
                "Request binding failed"
            );
        }
        bound
    }

    /// Render a handler's return value for the client's `Accept` header.
    ///
    /// Returns the chosen content type and the response text.
    ///
    /// # Errors
    ///
    /// Any serialization error; map it with [`CodecError::response_status`]
    /// (406 or 500).
    pub fn render_response(&self, value: &Value, accept: Option<&str>) -> CodecResult<(String, String)> {
        let (content_type, format) = self.produces.negotiate(accept)?;
        let text = media::write_body(value, &self.spec.signature.return_annotation, format, &self.config)?;
        Ok((content_type, text))
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("spec", &self.spec)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// All registered routes, keyed by method and path pattern.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    config: CodecConfig,
    routes: Vec<Arc<Route>>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        RouteRegistry {
            config,
            routes: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Validate and register a route.
    ///
    /// # Errors
    ///
    /// `SchemaError` when the signature is malformed, the return annotation
    /// lacks the root marker of a produced format, the body annotation lacks
    /// the root marker of a consumed format, or the method and path are
    /// already registered. `UnsupportedMediaType` for a media type no engine
    /// handles.
    pub fn register(&mut self, spec: RouteSpec) -> CodecResult<Arc<Route>> {
        if self.get(&spec.method, &spec.path).is_some() {
            return Err(CodecError::schema(format!(
                "route {} {} is already registered",
                spec.method, spec.path
            )));
        }
        spec.signature.validate()?;

        let consumes = if spec.consumes.is_empty() {
            self.config.consumes_table()?
        } else {
            MediaTable::consumes().restrict(spec.consumes.as_slice())?
        };
        let produces = if spec.produces.is_empty() {
            self.config.produces_table()?
        } else {
            MediaTable::produces().restrict(spec.produces.as_slice())?
        };

        for format in distinct(produces.formats()) {
            validate_root(&spec.signature.return_annotation, format.wire_format())?;
        }
        if let Some(body) = spec.signature.body_parameter() {
            for format in distinct(consumes.formats()) {
                validate_root(unwrap_body(&body.annotation), format.wire_format())?;
            }
        }

        info!(
            method = %spec.method,
            path = %spec.path,
            handler = %spec.signature.name,
            parameters = spec.signature.parameters.len(),
            status = spec.status.as_u16(),
            "Route registered"
        );

        let route = Arc::new(Route {
            spec,
            consumes,
            produces,
            config: self.config.serializer_config(),
        });
        self.routes.push(Arc::clone(&route));
        Ok(route)
    }

    #[must_use]
    pub fn get(&self, method: &Method, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|r| r.spec.method == *method && r.spec.path == path)
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn distinct(formats: impl Iterator<Item = BodyFormat>) -> Vec<BodyFormat> {
    let mut seen = Vec::new();
    for f in formats {
        if !seen.contains(&f) {
            seen.push(f);
        }
    }
    seen
}
