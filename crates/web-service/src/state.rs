// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the model service,
//! including configuration, the materialized routes, error reporters and
//! coordinated cancellation.

use std::sync::Arc;

use error_reporting::ErrorReporters;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::{ToSchema, openapi::OpenApi};

use crate::{
    config::{Environment, ServerConfig},
    docs::build_openapi,
    route_table::ServiceApp,
};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// Materialized service
    app: ServiceApp,
    /// API description generated from the route table
    openapi: Arc<OpenApi>,
    /// Sinks for internal errors
    reporters: ErrorReporters,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `app` - Materialized service to serve
    /// * `reporters` - Where internal errors are reported
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        app: ServiceApp,
        reporters: ErrorReporters,
        cancellation_token: CancellationToken,
    ) -> Self {
        let openapi = Arc::new(build_openapi(&app));
        Self {
            config: Arc::new(config),
            app,
            openapi,
            reporters,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Materialized service
    pub fn app(&self) -> &ServiceApp {
        &self.app
    }

    /// Generated API description
    pub fn openapi(&self) -> &OpenApi {
        &self.openapi
    }

    /// Error reporters
    pub fn reporters(&self) -> &ErrorReporters {
        &self.reporters
    }

    /// Perform health check operations
    pub fn health_check(&self) -> HealthCheck {
        let status = if self.cancellation_token.is_cancelled() {
            HealthStatus::Down {
                reason: Box::from("server is shutting down"),
            }
        } else {
            HealthStatus::Up
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            service: Box::from(self.app.service_name()),
            routes: self.app.route_count(),
        }
    }
}

/// Health status of the service
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not accepting work
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    #[schema(value_type = String)]
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Name of the served model
    pub service: Box<str>,
    /// Number of model endpoints
    pub routes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        WebServiceExt,
        endpoint::{Endpoint, EndpointRegistry, WebService},
    };

    struct Constant;

    impl WebService for Constant {
        fn endpoints(registry: &mut EndpointRegistry<Self>) {
            registry.mark(Endpoint::new("answer").returns::<i64>(), |_, _| Ok(42));
        }
    }

    fn state(token: CancellationToken) -> ServerState {
        ServerState::new(
            ServerConfig::for_testing(),
            Constant.into_app().unwrap(),
            ErrorReporters::new(),
            token,
        )
    }

    #[test]
    fn server_state_creation() {
        let state = state(CancellationToken::new());
        assert!(!state.cancellation_token.is_cancelled());
        assert_eq!(state.app().route_count(), 1);
        assert!(!state.reporters().notifies_team());
    }

    #[test]
    fn server_state_debug_includes_document() {
        let debug = format!("{:?}", state(CancellationToken::new()));
        assert!(debug.starts_with("ServerState"));
        assert!(debug.contains("openapi"));
    }

    #[test]
    fn health_reflects_service_and_environment() {
        let health = state(CancellationToken::new()).health_check();
        assert_eq!(health.status, HealthStatus::Up);
        assert_eq!(health.environment, Environment::Testing);
        assert_eq!(&*health.service, "Constant");
        assert_eq!(health.routes, 1);
    }

    #[test]
    fn health_goes_down_on_cancellation() {
        let token = CancellationToken::new();
        let state = state(token.clone());

        token.cancel();
        assert!(state.cancellation_token.is_cancelled());
        assert!(matches!(
            state.health_check().status,
            HealthStatus::Down { .. }
        ));
    }
}
