// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module binds the static service routes and every materialized model
//! route to their handlers.

pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{MethodFilter, get, on},
};
use handlers::{
    health_handler, invoke_route, landing_handler, method_not_allowed_handler, not_found_handler,
};
use tracing::debug;

use crate::{
    endpoint::EndpointMethod,
    error::ServerError,
    extractors::JsonBody,
    metrics::metrics_handler,
    openapi::{openapi_spec, redoc, swagger_ui},
    route_table::ServiceApp,
    state::ServerState,
};

/// Create application routes for `app`
pub fn create_routes(app: &ServiceApp) -> Router<ServerState> {
    let service_routes = Router::new()
        .route("/", get(landing_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/openapi.json", get(openapi_spec))
        .route("/docs", get(swagger_ui))
        .route("/redoc", get(redoc));

    let mut model_routes = Router::new();
    for route in app.routes().iter() {
        let filter = match route.endpoint().http_method() {
            EndpointMethod::Get => MethodFilter::GET,
            EndpointMethod::Post => MethodFilter::POST,
        };
        let bound = Arc::clone(route);
        debug!(path = route.path(), "binding model route");
        model_routes = model_routes.route(
            route.path(),
            on(filter, move |body: Result<JsonBody, ServerError>| {
                invoke_route(Arc::clone(&bound), body)
            }),
        );
    }

    Router::new()
        .merge(service_routes)
        .merge(docs_routes)
        .merge(model_routes)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .fallback(not_found_handler)
}
