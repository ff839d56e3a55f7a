// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Route table module
//!
//! Materialization turns the endpoints a [`WebService`] marks into an
//! immutable [`RouteTable`]. Every endpoint is checked before any route is
//! created, so an incomplete declaration fails service startup instead of a
//! request.

use std::{
    any::Any,
    collections::{BTreeMap, btree_map::Entry},
    fmt,
    sync::Arc,
};

use anyhow::anyhow;
use axum::Router;
use error_reporting::ErrorReporters;
use serde_json::{Map, Value};
use service_schema::{
    IssueKind, Location, LocationSegment, RecordSchema, ValidationError, ValidationIssue,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::ServerConfig,
    endpoint::{
        Arguments, Endpoint, EndpointError, EndpointMethod, EndpointRegistry, ReturnType,
        WebService,
    },
    server::create_router,
    state::ServerState,
};

/// Paths served by the application itself
pub const RESERVED_PATHS: [&str; 6] = ["/", "/docs", "/redoc", "/openapi.json", "/health", "/metrics"];

/// Location segment that prefixes every request body issue
pub const BODY_LOCATION: &str = "body";

/// A marked endpoint cannot be served
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Endpoint name is empty or not URL safe
    #[error(
        "endpoint name '{name}' must be non-empty and contain only ASCII letters, digits, '_' or '-'"
    )]
    InvalidName {
        /// Offending name
        name: String,
    },

    /// A parameter descriptor leaves its type unspecified
    #[error("parameter '{location}' of endpoint '{endpoint}' has no complete type declaration")]
    MissingParameterType {
        /// Endpoint name
        endpoint: String,
        /// Parameter name with the position of the unspecified type, e.g. `X[]`
        location: String,
    },

    /// Two parameters share a name
    #[error("endpoint '{endpoint}' declares parameter '{parameter}' more than once")]
    DuplicateParameter {
        /// Endpoint name
        endpoint: String,
        /// Repeated parameter name
        parameter: String,
    },

    /// No return type declared
    #[error(
        "endpoint '{endpoint}' does not declare a return type; use `returns_dynamic` to opt out of response validation"
    )]
    MissingReturnType {
        /// Endpoint name
        endpoint: String,
    },

    /// Path override is malformed
    #[error("endpoint '{endpoint}' has invalid path '{path}': {reason}")]
    InvalidPath {
        /// Endpoint name
        endpoint: String,
        /// Offending path
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Path collides with a route the application serves itself
    #[error("endpoint '{endpoint}' uses reserved path '{path}'")]
    ReservedPath {
        /// Endpoint name
        endpoint: String,
        /// Reserved path
        path: String,
    },

    /// Two endpoints resolve to one path
    #[error("endpoints '{first}' and '{second}' both resolve to path '{path}'")]
    DuplicatePath {
        /// Shared path
        path: String,
        /// Endpoint marked first
        first: String,
        /// Endpoint marked later
        second: String,
    },

    /// GET endpoints cannot receive a body
    #[error("GET endpoint '{endpoint}' cannot declare parameters")]
    BodyOnGet {
        /// Endpoint name
        endpoint: String,
    },
}

type Invoker = Arc<dyn Fn(Arguments) -> Result<Value, EndpointError> + Send + Sync>;

/// One HTTP path bound to exactly one marked endpoint
pub struct Route {
    path: String,
    endpoint: Endpoint,
    parameters: RecordSchema,
    invoker: Invoker,
}

impl Route {
    /// Route path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declaration the route was built from
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Schema of the request body
    pub fn parameters(&self) -> &RecordSchema {
        &self.parameters
    }

    /// Validate a request body and decode it into arguments
    ///
    /// `None` stands for an empty body, which is only accepted when the
    /// endpoint declares no parameters. Every issue is reported with a
    /// location starting at `body`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every mismatch.
    pub fn decode_body(&self, body: Option<Value>) -> Result<Arguments, ValidationError> {
        let body_location = || Location::from_segments([LocationSegment::from(BODY_LOCATION)]);

        let object = match body {
            Some(Value::Object(object)) => object,
            None if self.parameters.is_empty() => Map::new(),
            None => {
                return Err(ValidationError::single(ValidationIssue::new(
                    body_location(),
                    IssueKind::Missing,
                )));
            }
            Some(_) => {
                return Err(ValidationError::single(ValidationIssue::new(
                    body_location(),
                    IssueKind::Dict,
                )));
            }
        };

        self.parameters
            .validate_object(&object)
            .map_err(|e| e.prefixed(BODY_LOCATION))?;

        // Only declared parameters reach the handler.
        let arguments = object
            .into_iter()
            .filter(|(key, _)| self.parameters.get(key).is_some())
            .collect();
        Ok(Arguments::new(arguments))
    }

    /// Invoke the endpoint on a blocking worker and check its response
    ///
    /// # Errors
    ///
    /// Returns the handler's own error, or [`EndpointError::Internal`] when the
    /// handler panics or its response does not match the declared return type.
    pub async fn invoke(&self, arguments: Arguments) -> Result<Value, EndpointError> {
        let invoker = Arc::clone(&self.invoker);
        let output = tokio::task::spawn_blocking(move || invoker(arguments))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    EndpointError::Internal(anyhow!(
                        "endpoint '{}' panicked: {}",
                        self.endpoint.name(),
                        panic_message(e.into_panic().as_ref())
                    ))
                } else {
                    EndpointError::Internal(anyhow!(
                        "endpoint '{}' was cancelled",
                        self.endpoint.name()
                    ))
                }
            })??;

        if let Some(ReturnType::Declared(descriptor)) = self.endpoint.return_type()
            && let Err(e) = descriptor.validate(&output)
        {
            return Err(EndpointError::Internal(anyhow!(
                "response of endpoint '{}' does not match declared type {descriptor}: {e}",
                self.endpoint.name()
            )));
        }

        Ok(output)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Immutable mapping from route path to route
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, Arc<Route>>,
}

impl RouteTable {
    /// Route bound to `path`
    pub fn get(&self, path: &str) -> Option<&Arc<Route>> {
        self.routes.get(path)
    }

    /// Routes ordered by path
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.values()
    }

    /// Route paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Number of routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route exists
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A materialized service, ready to be bound to a listener
#[derive(Debug, Clone)]
pub struct ServiceApp {
    service_name: String,
    routes: Arc<RouteTable>,
}

impl ServiceApp {
    /// Materialize the route table for `instance`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when a marked endpoint is incomplete.
    pub fn materialize<S: WebService>(instance: S) -> Result<Self, ConfigurationError> {
        Self::materialize_shared(Arc::new(instance))
    }

    /// Materialize the route table for an instance the caller keeps a handle to
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] when a marked endpoint is incomplete.
    pub fn materialize_shared<S: WebService>(instance: Arc<S>) -> Result<Self, ConfigurationError> {
        let service_name = instance.service_name();

        let mut registry = EndpointRegistry::new();
        S::endpoints(&mut registry);

        let mut owners: BTreeMap<String, &str> = BTreeMap::new();
        for endpoint in registry.endpoints() {
            check_endpoint(endpoint)?;
            match owners.entry(endpoint.route_path()) {
                Entry::Occupied(entry) => {
                    return Err(ConfigurationError::DuplicatePath {
                        path: entry.key().clone(),
                        first: (*entry.get()).to_string(),
                        second: endpoint.name().to_string(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(endpoint.name());
                }
            }
        }

        let mut routes = BTreeMap::new();
        for marked in registry.into_marked() {
            let path = marked.endpoint.route_path();
            let parameters = marked.endpoint.parameter_schema();
            let handler = marked.handler;
            let instance = Arc::clone(&instance);
            let invoker: Invoker = Arc::new(move |arguments| handler(&instance, arguments));

            debug!(path = %path, method = %marked.endpoint.http_method(), "registered route");
            routes.insert(
                path.clone(),
                Arc::new(Route {
                    path,
                    endpoint: marked.endpoint,
                    parameters,
                    invoker,
                }),
            );
        }

        info!(
            service = %service_name,
            routes = routes.len(),
            "materialized web service"
        );

        Ok(Self {
            service_name,
            routes: Arc::new(RouteTable { routes }),
        })
    }

    /// Service name
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Number of routes, equal to the number of marked endpoints
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// The route table
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Axum router serving this application with default configuration
    ///
    /// Errors are logged but not sent to any remote channel.
    pub fn into_router(self) -> Router {
        let state = ServerState::new(
            ServerConfig::default(),
            self,
            ErrorReporters::new(),
            CancellationToken::new(),
        );
        create_router(state)
    }
}

fn check_endpoint(endpoint: &Endpoint) -> Result<(), ConfigurationError> {
    let name = endpoint.name();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigurationError::InvalidName {
            name: name.to_string(),
        });
    }

    for field in endpoint.params() {
        if let Some(position) = field.descriptor.find_unspecified() {
            return Err(ConfigurationError::MissingParameterType {
                endpoint: name.to_string(),
                location: format!("{}{position}", field.name),
            });
        }
    }

    if let Some(parameter) = endpoint.duplicate_params() {
        return Err(ConfigurationError::DuplicateParameter {
            endpoint: name.to_string(),
            parameter: parameter.to_string(),
        });
    }

    match endpoint.return_type() {
        None => {
            return Err(ConfigurationError::MissingReturnType {
                endpoint: name.to_string(),
            });
        }
        Some(ReturnType::Dynamic) => {
            warn!(
                endpoint = name,
                "endpoint opted out of response validation, responses are serialized as returned"
            );
        }
        Some(ReturnType::Declared(_)) => {}
    }

    let path = endpoint.route_path();
    if let Some(reason) = invalid_path_reason(&path) {
        return Err(ConfigurationError::InvalidPath {
            endpoint: name.to_string(),
            path,
            reason: reason.to_string(),
        });
    }
    if RESERVED_PATHS.contains(&path.as_str()) {
        return Err(ConfigurationError::ReservedPath {
            endpoint: name.to_string(),
            path,
        });
    }

    if endpoint.http_method() == EndpointMethod::Get && !endpoint.params().is_empty() {
        return Err(ConfigurationError::BodyOnGet {
            endpoint: name.to_string(),
        });
    }

    Ok(())
}

fn invalid_path_reason(path: &str) -> Option<&'static str> {
    if !path.starts_with('/') {
        Some("must start with '/'")
    } else if path == "/" {
        Some("must not be the root path")
    } else if path.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else if path.contains(['{', '}', '*', ':']) {
        Some("must not contain route parameters")
    } else if path.contains("//") {
        Some("must not contain empty segments")
    } else {
        None
    }
}
