// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint declaration module
//!
//! A model exposes methods over HTTP by implementing [`WebService`] and marking
//! each method in [`WebService::endpoints`]. Every mark pairs an [`Endpoint`]
//! declaration, which carries explicit schema descriptors for the parameters
//! and the return value, with a handler closure that calls the method.
//!
//! Marking does not wrap or alter the method itself: calling it in-process
//! bypasses the HTTP layer entirely.

use std::{collections::BTreeSet, fmt};

use anyhow::anyhow;
use axum::http::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use service_schema::{Field, RecordSchema, Schema, TypeDescriptor};
use thiserror::Error;

use crate::route_table::{ConfigurationError, ServiceApp};

/// HTTP method an endpoint is exposed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EndpointMethod {
    /// Parameterless endpoints only
    Get,
    /// Arguments are read from a JSON object body
    #[default]
    Post,
}

impl EndpointMethod {
    /// Equivalent HTTP method
    pub fn as_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
        }
    }
}

impl fmt::Display for EndpointMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Declared return type of an endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    /// Responses are validated against this descriptor
    Declared(TypeDescriptor),
    /// Responses are serialized as-is without validation
    Dynamic,
}

impl ReturnType {
    /// Descriptor used for documentation
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Declared(descriptor) => descriptor.clone(),
            Self::Dynamic => TypeDescriptor::Any,
        }
    }
}

/// Declaration of a remotely invokable method
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    name: String,
    params: Vec<Field>,
    returns: Option<ReturnType>,
    path: Option<String>,
    method: EndpointMethod,
    summary: Option<String>,
    tags: Vec<String>,
}

impl Endpoint {
    /// Start a declaration for the method `name`
    ///
    /// The route path defaults to `/{name}` and the method to POST.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            path: None,
            method: EndpointMethod::default(),
            summary: None,
            tags: Vec::new(),
        }
    }

    /// Declare a parameter whose type is described by `T`
    #[must_use]
    pub fn param<T: Schema>(self, name: impl Into<String>) -> Self {
        self.param_with(name, T::schema())
    }

    /// Declare a parameter with an explicit descriptor
    #[must_use]
    pub fn param_with(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.params.push(Field {
            name: name.into(),
            descriptor,
        });
        self
    }

    /// Declare the return type as described by `R`
    #[must_use]
    pub fn returns<R: Schema>(self) -> Self {
        self.returns_with(R::schema())
    }

    /// Declare the return type with an explicit descriptor
    #[must_use]
    pub fn returns_with(mut self, descriptor: TypeDescriptor) -> Self {
        self.returns = Some(ReturnType::Declared(descriptor));
        self
    }

    /// Serialize whatever the handler returns without validating it
    #[must_use]
    pub fn returns_dynamic(mut self) -> Self {
        self.returns = Some(ReturnType::Dynamic);
        self
    }

    /// Override the route path
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override the HTTP method
    #[must_use]
    pub fn method(mut self, method: EndpointMethod) -> Self {
        self.method = method;
        self
    }

    /// Short description for the generated API documentation
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Group the endpoint under `tag` in the generated API documentation
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in declaration order
    pub fn params(&self) -> &[Field] {
        &self.params
    }

    /// Declared return type, if any
    pub fn return_type(&self) -> Option<&ReturnType> {
        self.returns.as_ref()
    }

    /// Route path, either the override or `/{name}`
    pub fn route_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("/{}", self.name))
    }

    /// Whether the path was overridden
    pub fn has_custom_path(&self) -> bool {
        self.path.is_some()
    }

    /// HTTP method
    pub fn http_method(&self) -> EndpointMethod {
        self.method
    }

    /// Summary for documentation
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Documentation tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Record schema of the request body
    pub fn parameter_schema(&self) -> RecordSchema {
        self.params.iter().fold(
            RecordSchema::new(format!("Body_{}", self.name)),
            |record, field| record.field_with(field.name.clone(), field.descriptor.clone()),
        )
    }

    /// Names declared more than once
    pub(crate) fn duplicate_params(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.params
            .iter()
            .map(|field| field.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

/// Failure raised by an endpoint handler
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Deliberate HTTP error; 4xx statuses are returned to the caller as-is,
    /// 5xx statuses are additionally reported
    #[error("{message}")]
    Http {
        /// Response status
        status: StatusCode,
        /// Response detail
        message: String,
    },

    /// Unexpected failure inside the model; always reported
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EndpointError {
    /// HTTP error with `status`
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    /// 409 Conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::http(StatusCode::CONFLICT, message)
    }

    /// Internal error from a message
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::Internal(anyhow!("{message}"))
    }
}

/// Decoded arguments of a single invocation
///
/// Arguments have already been validated against the declared parameter
/// schema when a handler receives them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Wrap a decoded JSON object
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Deserialize the argument `name`
    ///
    /// An absent argument deserializes from `null`, so optional parameters
    /// can be read as `Option<T>`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Internal`] when the value does not fit `T`,
    /// which means the handler and the declared descriptor disagree.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, EndpointError> {
        let value = self.0.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            EndpointError::Internal(anyhow!("failed to decode argument '{name}': {e}"))
        })
    }

    /// Raw JSON value of the argument `name`
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of arguments present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no argument is present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub(crate) type Handler<S> =
    Box<dyn Fn(&S, Arguments) -> Result<Value, EndpointError> + Send + Sync>;

pub(crate) struct Marked<S> {
    pub(crate) endpoint: Endpoint,
    pub(crate) handler: Handler<S>,
}

/// Ordered list of the endpoints a service marks
pub struct EndpointRegistry<S> {
    marked: Vec<Marked<S>>,
}

impl<S> EndpointRegistry<S> {
    /// Empty registry
    pub fn new() -> Self {
        Self { marked: Vec::new() }
    }

    /// Mark a method as remotely invokable
    ///
    /// `handler` receives the service and the validated arguments; its return
    /// value is serialized with serde.
    pub fn mark<R, F>(&mut self, endpoint: Endpoint, handler: F) -> &mut Self
    where
        R: Serialize,
        F: Fn(&S, Arguments) -> Result<R, EndpointError> + Send + Sync + 'static,
    {
        let name = endpoint.name().to_string();
        let handler: Handler<S> = Box::new(move |service, arguments| {
            let output = handler(service, arguments)?;
            serde_json::to_value(output).map_err(|e| {
                EndpointError::Internal(anyhow!(
                    "failed to serialize response of '{name}': {e}"
                ))
            })
        });
        self.marked.push(Marked { endpoint, handler });
        self
    }

    /// Declarations in marking order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.marked.iter().map(|marked| &marked.endpoint)
    }

    /// Number of marked endpoints
    pub fn len(&self) -> usize {
        self.marked.len()
    }

    /// Whether nothing is marked
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    pub(crate) fn into_marked(self) -> Vec<Marked<S>> {
        self.marked
    }
}

impl<S> Default for EndpointRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for EndpointRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.marked.iter().map(|marked| marked.endpoint.name()))
            .finish()
    }
}

/// An object whose marked methods can be served over HTTP
pub trait WebService: Send + Sync + Sized + 'static {
    /// Mark the methods to expose
    fn endpoints(registry: &mut EndpointRegistry<Self>);

    /// Name shown on the landing page and in the API documentation
    fn service_name(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }
}

/// Conversion of a [`WebService`] into a served application
pub trait WebServiceExt: WebService {
    /// Materialize the route table for this instance
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when a marked endpoint is incomplete.
    fn into_app(self) -> Result<ServiceApp, ConfigurationError> {
        ServiceApp::materialize(self)
    }
}

impl<S: WebService> WebServiceExt for S {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Echo;

    impl WebService for Echo {
        fn endpoints(registry: &mut EndpointRegistry<Self>) {
            registry.mark(
                Endpoint::new("echo").param::<String>("text").returns::<String>(),
                |_, args| args.get::<String>("text"),
            );
        }
    }

    #[test]
    fn endpoint_defaults() {
        let endpoint = Endpoint::new("predict").param::<Vec<f64>>("x");
        assert_eq!(endpoint.route_path(), "/predict");
        assert_eq!(endpoint.http_method(), EndpointMethod::Post);
        assert!(endpoint.return_type().is_none());
        assert!(!endpoint.has_custom_path());
    }

    #[test]
    fn endpoint_overrides() {
        let endpoint = Endpoint::new("mode")
            .method(EndpointMethod::Get)
            .path("/current-mode")
            .summary("Most frequent label")
            .tag("model")
            .returns::<Option<f64>>();
        assert_eq!(endpoint.route_path(), "/current-mode");
        assert_eq!(endpoint.http_method().to_string(), "GET");
        assert_eq!(endpoint.summary_text(), Some("Most frequent label"));
        assert_eq!(endpoint.tags(), ["model".to_string()]);
        assert_eq!(
            endpoint.return_type(),
            Some(&ReturnType::Declared(TypeDescriptor::optional(
                TypeDescriptor::Number
            )))
        );
    }

    #[test]
    fn parameter_schema_mirrors_params() {
        let endpoint = Endpoint::new("add").param::<i64>("a").param::<i64>("b");
        let schema = endpoint.parameter_schema();
        assert_eq!(schema.name(), "Body_add");
        assert_eq!(schema.required_fields().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn duplicate_params_detected() {
        let endpoint = Endpoint::new("add").param::<i64>("a").param::<f64>("a");
        assert_eq!(endpoint.duplicate_params(), Some("a"));
        assert_eq!(Endpoint::new("noop").duplicate_params(), None);
    }

    #[test]
    fn arguments_decode() {
        let args = Arguments::new(
            json!({"x": [[1.0, 2.0]], "k": 3})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(args.get::<Vec<Vec<f64>>>("x").unwrap(), vec![vec![1.0, 2.0]]);
        assert_eq!(args.get::<Option<u32>>("missing").unwrap(), None);
        assert!(matches!(
            args.get::<String>("k"),
            Err(EndpointError::Internal(_))
        ));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn registry_serializes_handler_output() {
        let mut registry = EndpointRegistry::new();
        Echo::endpoints(&mut registry);
        assert_eq!(registry.len(), 1);
        assert_eq!(format!("{registry:?}"), r#"["echo"]"#);

        let marked = registry.into_marked();
        let args = Arguments::new(json!({"text": "hi"}).as_object().cloned().unwrap());
        let output = (marked[0].handler)(&Echo, args).unwrap();
        assert_eq!(output, json!("hi"));
    }

    #[test]
    fn default_service_name() {
        assert_eq!(Echo.service_name(), "Echo");
    }

    #[test]
    fn endpoint_error_helpers() {
        match EndpointError::conflict("not fitted") {
            EndpointError::Http { status, message } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "not fitted");
            }
            EndpointError::Internal(_) => panic!("expected http error"),
        }
        assert_eq!(EndpointError::internal("boom").to_string(), "boom");
    }
}
