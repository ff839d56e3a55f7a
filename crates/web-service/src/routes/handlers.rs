// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides the landing page, health check and the generic
//! handler that dispatches a request to a materialized route.

use std::{sync::Arc, time::Instant};

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    endpoint::EndpointError,
    error::ServerError,
    extractors::JsonBody,
    metrics::{self, InvocationResult},
    route_table::Route,
    state::{HealthStatus, ServerState},
};

/// Links to the generated documentation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DocumentationRoutes {
    /// Swagger UI
    pub swagger: String,
    /// `ReDoc`
    pub redoc: String,
    /// Raw `OpenAPI` document
    pub open_api_schema: String,
}

impl Default for DocumentationRoutes {
    fn default() -> Self {
        Self {
            swagger: "/docs".to_string(),
            redoc: "/redoc".to_string(),
            open_api_schema: "/openapi.json".to_string(),
        }
    }
}

/// One model route as listed on the landing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct RouteSummary {
    /// Route path
    pub path: String,
    /// HTTP method
    pub method: String,
    /// Endpoint name
    pub endpoint: String,
}

/// Landing page document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Landing {
    /// Human readable description of the service
    pub description: String,
    /// Name of the served model
    pub service: String,
    /// Model routes
    pub routes: Vec<RouteSummary>,
    /// Documentation links
    pub documentation_routes: DocumentationRoutes,
}

/// Landing page handler
pub async fn landing_handler(State(state): State<ServerState>) -> Json<Landing> {
    let app = state.app();
    let routes = app
        .routes()
        .iter()
        .map(|route| RouteSummary {
            path: route.path().to_string(),
            method: route.endpoint().http_method().to_string(),
            endpoint: route.endpoint().name().to_string(),
        })
        .collect();

    Json(Landing {
        description: format!(
            "This web service was generated for the {} model. See the documentation routes for the available endpoints.",
            app.service_name()
        ),
        service: app.service_name().to_string(),
        routes,
        documentation_routes: DocumentationRoutes::default(),
    })
}

/// Health check endpoint handler
///
/// Answers 503 once shutdown has started so load balancers stop routing here.
pub async fn health_handler(State(state): State<ServerState>) -> Response {
    let health = state.health_check();
    let status = match health.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health)).into_response()
}

/// Fallback for unknown paths
pub async fn not_found_handler() -> ServerError {
    ServerError::NotFound
}

/// Fallback for known paths requested with an unsupported method
pub async fn method_not_allowed_handler() -> ServerError {
    ServerError::MethodNotAllowed
}

/// Validate the body, invoke the route and encode its response
///
/// # Errors
///
/// Returns [`ServerError::Validation`] when the body does not match the
/// declared parameters, or the converted [`EndpointError`] of the handler.
#[instrument(skip_all, fields(route = route.path()))]
pub async fn invoke_route(
    route: Arc<Route>,
    body: Result<JsonBody, ServerError>,
) -> Result<Json<Value>, ServerError> {
    let result = dispatch(&route, body).await;
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(error) => error.status_code(),
    };
    metrics::inc_requests(route.path(), status);
    result.map(Json)
}

async fn dispatch(route: &Route, body: Result<JsonBody, ServerError>) -> Result<Value, ServerError> {
    let arguments = match body.and_then(|JsonBody(body)| Ok(route.decode_body(body)?)) {
        Ok(arguments) => arguments,
        Err(error) => {
            if matches!(error, ServerError::Validation(_)) {
                metrics::inc_validation_failures(route.path());
            }
            debug!(error = %error, "rejected request body");
            return Err(error);
        }
    };

    let started = Instant::now();
    let outcome = route.invoke(arguments).await;
    let result = match &outcome {
        Ok(_) => InvocationResult::Success,
        Err(EndpointError::Http { status, .. }) if status.is_client_error() => {
            InvocationResult::ClientError
        }
        Err(_) => InvocationResult::Error,
    };
    metrics::observe_invocation_duration(route.path(), result, started.elapsed().as_secs_f64());

    Ok(outcome?)
}
