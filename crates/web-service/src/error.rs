// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the error types for server operations and maps every
//! request failure onto a status code and a `{"detail": ...}` JSON body.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use service_schema::ValidationError;
use thiserror::Error;

use crate::endpoint::EndpointError;

/// Detail returned to callers for unexpected failures
pub const INTERNAL_ERROR_DETAIL: &str = "An internal error has occurred.";

/// Appended to [`INTERNAL_ERROR_DETAIL`] when the team was notified
pub const TEAM_NOTIFIED_SUFFIX: &str = " Our team has been notified of this incident.";

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Request body does not match the endpoint's parameters
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Request body exceeds the configured limit
    #[error("Request body is too large")]
    PayloadTooLarge,

    /// No route for the requested path
    #[error("Not Found")]
    NotFound,

    /// The path exists but not for the requested method
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Deliberate HTTP error raised by an endpoint
    #[error("{message}")]
    Endpoint {
        /// Status chosen by the endpoint
        status: StatusCode,
        /// Detail returned to the caller
        message: String,
    },

    /// Unexpected failure while serving a route
    #[error("Internal error: {message}")]
    Internal {
        /// Description for logs and reports; never sent to the caller
        message: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Response extension marking a failure that must be logged and reported
///
/// Attached by [`ServerError::into_response`] and consumed by the error
/// reporting middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    /// Message to report
    pub message: String,
    /// Whether the caller received the generic internal error detail
    pub generic_detail: bool,
}

impl ServerError {
    /// HTTP status of the error response
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Endpoint { status, .. } => *status,
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (json_body, reported) = match &self {
            ServerError::Validation(error) => (json!({ "detail": error.issues() }), None),
            ServerError::PayloadTooLarge
            | ServerError::NotFound
            | ServerError::MethodNotAllowed => {
                (json!({ "detail": self.to_string() }), None)
            }
            ServerError::Endpoint { message, .. } => {
                let reported = status.is_server_error().then(|| ReportedError {
                    message: message.clone(),
                    generic_detail: false,
                });
                (json!({ "detail": message }), reported)
            }
            ServerError::Internal { message } => (
                json!({ "detail": INTERNAL_ERROR_DETAIL }),
                Some(ReportedError {
                    message: message.clone(),
                    generic_detail: true,
                }),
            ),
            ServerError::Config { .. }
            | ServerError::Bind { .. }
            | ServerError::Startup { .. }
            | ServerError::Shutdown { .. }
            | ServerError::TaskJoin { .. } => (
                json!({ "detail": INTERNAL_ERROR_DETAIL }),
                Some(ReportedError {
                    message: self.to_string(),
                    generic_detail: true,
                }),
            ),
        };

        let mut response = (status, Json(json_body)).into_response();
        if let Some(reported) = reported {
            response.extensions_mut().insert(reported);
        }
        response
    }
}

impl From<EndpointError> for ServerError {
    fn from(error: EndpointError) -> Self {
        match error {
            EndpointError::Http { status, message } => Self::Endpoint { status, message },
            EndpointError::Internal(source) => Self::Internal {
                message: format!("{source:#}"),
            },
        }
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::body::to_bytes;
    use serde_json::Value;
    use service_schema::{IssueKind, Location, LocationSegment, ValidationIssue};

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_use_detail_list() {
        let error = ServerError::from(ValidationError::single(ValidationIssue::new(
            Location::from_segments([LocationSegment::from("body"), LocationSegment::from("a")]),
            IssueKind::Float,
        )));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.extensions().get::<ReportedError>().is_none());
        assert_eq!(
            body_json(response).await,
            json!({"detail": [{"loc": ["body", "a"], "msg": "value is not a valid float", "type": "type_error.float"}]})
        );
    }

    #[tokio::test]
    async fn client_endpoint_errors_pass_through() {
        let error = ServerError::from(EndpointError::conflict("model has not been fitted"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.extensions().get::<ReportedError>().is_none());
        assert_eq!(
            body_json(response).await,
            json!({"detail": "model has not been fitted"})
        );
    }

    #[tokio::test]
    async fn server_endpoint_errors_are_reported_with_their_detail() {
        let error = ServerError::from(EndpointError::http(
            StatusCode::SERVICE_UNAVAILABLE,
            "model is reloading",
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.extensions().get::<ReportedError>(),
            Some(&ReportedError {
                message: "model is reloading".to_string(),
                generic_detail: false,
            })
        );
        assert_eq!(body_json(response).await, json!({"detail": "model is reloading"}));
    }

    #[tokio::test]
    async fn internal_errors_hide_their_message() {
        let error = ServerError::from(EndpointError::Internal(
            anyhow!("index out of bounds").context("predict failed"),
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let reported = response.extensions().get::<ReportedError>().cloned().unwrap();
        assert_eq!(reported.message, "predict failed: index out of bounds");
        assert!(reported.generic_detail);
        assert_eq!(
            body_json(response).await,
            json!({"detail": INTERNAL_ERROR_DETAIL})
        );
    }

    #[tokio::test]
    async fn not_found_detail() {
        let response = ServerError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn method_not_allowed_detail() {
        let response = ServerError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.extensions().get::<ReportedError>().is_none());
        assert_eq!(
            body_json(response).await,
            json!({"detail": "Method Not Allowed"})
        );
    }
}
