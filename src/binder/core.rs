use crate::codec::conform;
use crate::error::{CodecError, CodecResult};
use crate::json;
use crate::rename::SerializerConfig;
use crate::schema::{is_body, is_list, is_optional, unwrap_body, unwrap_optional, validate_schema, TypeAnnotation};
use crate::value::Value;
use serde_json::Value as JsonValue;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of route captures stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Route captures as `(name, value)` pairs, inline for the common case.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Read access to the path parameters captured by the router.
pub trait PathParams {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl PathParams for ParamVec {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

impl PathParams for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl PathParams for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// How a parameter may be supplied, in the order parameters must be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
}

impl ParameterKind {
    #[inline]
    #[must_use]
    pub fn is_positional(self) -> bool {
        !matches!(self, ParameterKind::KeywordOnly)
    }
}

/// One parameter of a handler signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Internal (code-facing) name; the wire key is derived with the
    /// serialize-direction renamer
    pub name: String,
    pub annotation: TypeAnnotation,
    pub kind: ParameterKind,
    /// Declared default; `None` means the parameter is required
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, annotation: TypeAnnotation, kind: ParameterKind) -> Self {
        Parameter {
            name: name.into(),
            annotation,
            kind,
            default: None,
        }
    }

    pub fn positional(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        Parameter::new(name, annotation, ParameterKind::PositionalOrKeyword)
    }

    pub fn positional_only(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        Parameter::new(name, annotation, ParameterKind::PositionalOnly)
    }

    pub fn keyword(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        Parameter::new(name, annotation, ParameterKind::KeywordOnly)
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn is_body(&self) -> bool {
        is_body(&self.annotation)
    }
}

/// A handler's callable signature: ordered parameters and return annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_annotation: TypeAnnotation,
}

impl Signature {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_annotation: TypeAnnotation,
    ) -> Self {
        Signature {
            name: name.into(),
            parameters,
            return_annotation,
        }
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The parameter marked as the request body, if any.
    #[must_use]
    pub fn body_parameter(&self) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.is_body())
    }

    /// Check the signature once, at registration time.
    ///
    /// # Errors
    ///
    /// `SchemaError` when parameter kinds are out of order, a name repeats, a
    /// required positional parameter follows a defaulted one, more than one
    /// parameter is a body, or any annotation is malformed.
    pub fn validate(&self) -> CodecResult<()> {
        let mut previous = ParameterKind::PositionalOnly;
        let mut seen_default = false;
        let mut bodies = 0;
        for (i, p) in self.parameters.iter().enumerate() {
            if p.kind < previous {
                return Err(CodecError::schema(format!(
                    "{}: parameter '{}' is {:?} after a {:?} parameter",
                    self.name, p.name, p.kind, previous
                )));
            }
            previous = p.kind;
            if self.parameters[..i].iter().any(|q| q.name == p.name) {
                return Err(CodecError::schema(format!(
                    "{}: duplicate parameter '{}'",
                    self.name, p.name
                )));
            }
            if p.kind.is_positional() {
                if p.default.is_some() {
                    seen_default = true;
                } else if seen_default {
                    return Err(CodecError::schema(format!(
                        "{}: required parameter '{}' follows a parameter with a default",
                        self.name, p.name
                    )));
                }
            }
            if p.is_body() {
                bodies += 1;
            }
            validate_schema(&p.annotation)?;
        }
        if bodies > 1 {
            return Err(CodecError::schema(format!(
                "{}: at most one body parameter is allowed, found {}",
                self.name, bodies
            )));
        }
        validate_schema(&self.return_annotation)
    }
}

/// Positional and keyword arguments ready to be handed to a handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    pub args: Vec<Value>,
    /// Keyed by the parameter's original (non-renamed) name
    pub kwargs: HashMap<String, Value>,
}

impl BoundArguments {
    /// Look a bound value up by parameter name, wherever it was placed.
    #[must_use]
    pub fn get<'a>(&'a self, signature: &Signature, name: &str) -> Option<&'a Value> {
        if let Some(v) = self.kwargs.get(name) {
            return Some(v);
        }
        signature
            .parameters
            .iter()
            .filter(|p| p.kind.is_positional())
            .position(|p| p.name == name)
            .and_then(|i| self.args.get(i))
    }
}

/// Where a parameter's value came from, for logging.
#[derive(Debug, Clone, Copy)]
enum Source {
    Body,
    Path,
    Query,
    Default,
    Absent,
}

/// Bind route captures, query values and the request body to `signature`.
///
/// Per parameter, in declaration order:
///
/// 1. a body parameter takes the value produced by `body_reader`, which is
///    invoked at most once with the unwrapped body annotation
/// 2. otherwise the wire key (serialize-direction renamer) is looked up in
///    `route_matches`, then in `query`; list annotations take every query
///    value, others the first
/// 3. otherwise the declared default, then `Value::Null` for optionals
/// 4. otherwise `MissingRequiredField`
///
/// Positional-only and positional-or-keyword parameters land in
/// [`BoundArguments::args`]; keyword-only parameters in
/// [`BoundArguments::kwargs`] under their original name.
///
/// # Errors
///
/// `MissingRequiredField` for unsupplied required parameters, any
/// deserialization error for supplied ones, whatever `body_reader` returns,
/// and `SchemaError` if the signature declares a second body parameter.
pub async fn bind<M, R, Fut>(
    signature: &Signature,
    route_matches: &M,
    query: &HashMap<String, Vec<String>>,
    body_reader: R,
    config: &SerializerConfig,
) -> CodecResult<BoundArguments>
where
    M: PathParams + ?Sized,
    R: FnOnce(TypeAnnotation) -> Fut,
    Fut: Future<Output = CodecResult<Value>>,
{
    let mut body_reader = Some(body_reader);
    let mut bound = BoundArguments::default();

    for parameter in &signature.parameters {
        let (value, source) = if parameter.is_body() {
            let reader = body_reader.take().ok_or_else(|| {
                CodecError::schema(format!(
                    "{}: the request body can only be bound once",
                    signature.name
                ))
            })?;
            let value = reader(unwrap_body(&parameter.annotation).clone()).await?;
            (value, Source::Body)
        } else {
            resolve(parameter, route_matches, query, config)?
        };

        debug!(
            handler = %signature.name,
            parameter = %parameter.name,
            source = ?source,
            "Parameter bound"
        );

        if parameter.kind.is_positional() {
            bound.args.push(value);
        } else {
            bound.kwargs.insert(parameter.name.clone(), value);
        }
    }

    Ok(bound)
}

fn resolve<M>(
    parameter: &Parameter,
    route_matches: &M,
    query: &HashMap<String, Vec<String>>,
    config: &SerializerConfig,
) -> CodecResult<(Value, Source)>
where
    M: PathParams + ?Sized,
{
    let key = config.external_name(&parameter.name);

    if let Some(text) = route_matches.lookup(&key) {
        let node = JsonValue::String(text.to_string());
        return json::deserialize(&node, &parameter.annotation, config).map(|v| (v, Source::Path));
    }

    if let Some(values) = query.get(&key).filter(|v| !v.is_empty()) {
        let node = if takes_all_values(&parameter.annotation) {
            JsonValue::Array(values.iter().cloned().map(JsonValue::String).collect())
        } else {
            JsonValue::String(values[0].clone())
        };
        return json::deserialize(&node, &parameter.annotation, config).map(|v| (v, Source::Query));
    }

    if let Some(default) = &parameter.default {
        return conform(default.clone(), &parameter.annotation).map(|v| (v, Source::Default));
    }
    if is_optional(&parameter.annotation) {
        return Ok((Value::Null, Source::Absent));
    }
    Err(CodecError::missing(key))
}

/// `List[T]` and `Optional[List[T]]` receive every repeated query value.
fn takes_all_values(annotation: &TypeAnnotation) -> bool {
    is_list(annotation) || (is_optional(annotation) && is_list(&unwrap_optional(annotation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use rust_decimal::Decimal;

    async fn no_body(_: TypeAnnotation) -> CodecResult<Value> {
        Err(CodecError::schema("no body expected"))
    }

    fn query(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_param_vec_lookup() {
        let mut params = ParamVec::new();
        params.push((Arc::from("id"), "42".to_string()));
        assert_eq!(params.lookup("id"), Some("42"));
        assert_eq!(params.lookup("missing"), None);
    }

    #[test]
    fn test_path_value_is_decoded() {
        let sig = Signature::new(
            "get_book",
            vec![Parameter::positional("book_id", TypeAnnotation::integer())],
            TypeAnnotation::string(),
        );
        let mut matches = ParamVec::new();
        matches.push((Arc::from("bookId"), "7".to_string()));
        let bound = block_on(bind(&sig, &matches, &HashMap::new(), no_body, &SerializerConfig::default())).unwrap();
        assert_eq!(bound.args, vec![Value::Int(7)]);
    }

    #[test]
    fn test_default_beats_optional_none() {
        let sig = Signature::new(
            "f",
            vec![
                Parameter::keyword("scale", TypeAnnotation::optional(TypeAnnotation::decimal()))
                    .with_default(Decimal::ONE),
                Parameter::keyword("limit", TypeAnnotation::optional(TypeAnnotation::integer())),
            ],
            TypeAnnotation::string(),
        );
        let bound = block_on(bind(
            &sig,
            &HashMap::<String, String>::new(),
            &HashMap::new(),
            no_body,
            &SerializerConfig::default(),
        ))
        .unwrap();
        assert_eq!(bound.kwargs.get("scale"), Some(&Value::Decimal(Decimal::ONE)));
        assert_eq!(bound.kwargs.get("limit"), Some(&Value::Null));
    }

    #[test]
    fn test_query_first_value_for_scalars() {
        let sig = Signature::new(
            "f",
            vec![Parameter::keyword("page", TypeAnnotation::integer())],
            TypeAnnotation::string(),
        );
        let q = query(&[("page", &["2", "3"])]);
        let bound = block_on(bind(&sig, &ParamVec::new(), &q, no_body, &SerializerConfig::default())).unwrap();
        assert_eq!(bound.kwargs.get("page"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_optional_list_takes_all_values() {
        let sig = Signature::new(
            "f",
            vec![Parameter::keyword(
                "ids",
                TypeAnnotation::optional(TypeAnnotation::list(TypeAnnotation::integer())),
            )],
            TypeAnnotation::string(),
        );
        let q = query(&[("ids", &["1", "2", "3"])]);
        let bound = block_on(bind(&sig, &ParamVec::new(), &q, no_body, &SerializerConfig::default())).unwrap();
        assert_eq!(
            bound.kwargs.get("ids"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn test_body_reader_receives_unwrapped_annotation() {
        let sig = Signature::new(
            "create",
            vec![Parameter::positional("note", TypeAnnotation::body(TypeAnnotation::string()))],
            TypeAnnotation::string(),
        );
        let reader = |annotation: TypeAnnotation| async move {
            assert_eq!(annotation, TypeAnnotation::string());
            Ok(Value::from("from body"))
        };
        let bound = block_on(bind(&sig, &ParamVec::new(), &HashMap::new(), reader, &SerializerConfig::default())).unwrap();
        assert_eq!(bound.args, vec![Value::from("from body")]);
    }

    #[test]
    fn test_validate_rejects_bad_signatures() {
        let out_of_order = Signature::new(
            "f",
            vec![
                Parameter::keyword("a", TypeAnnotation::string()),
                Parameter::positional("b", TypeAnnotation::string()),
            ],
            TypeAnnotation::string(),
        );
        assert!(out_of_order.validate().is_err());

        let two_bodies = Signature::new(
            "f",
            vec![
                Parameter::positional("a", TypeAnnotation::body(TypeAnnotation::string())),
                Parameter::positional("b", TypeAnnotation::body(TypeAnnotation::string())),
            ],
            TypeAnnotation::string(),
        );
        assert_eq!(two_bodies.validate().unwrap_err().kind(), "SchemaError");

        let required_after_default = Signature::new(
            "f",
            vec![
                Parameter::positional("a", TypeAnnotation::string()).with_default("x"),
                Parameter::positional("b", TypeAnnotation::string()),
            ],
            TypeAnnotation::string(),
        );
        assert!(required_after_default.validate().is_err());
    }

    #[test]
    fn test_get_by_name() {
        let sig = Signature::new(
            "f",
            vec![
                Parameter::positional("a", TypeAnnotation::string()),
                Parameter::keyword("b", TypeAnnotation::string()),
            ],
            TypeAnnotation::string(),
        );
        let bound = BoundArguments {
            args: vec![Value::from("x")],
            kwargs: HashMap::from([("b".to_string(), Value::from("y"))]),
        };
        assert_eq!(bound.get(&sig, "a"), Some(&Value::from("x")));
        assert_eq!(bound.get(&sig, "b"), Some(&Value::from("y")));
        assert_eq!(bound.get(&sig, "c"), None);
    }
}
