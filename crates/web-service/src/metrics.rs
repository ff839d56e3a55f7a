// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use tracing::error;

/// Total number of endpoint requests, labeled by route and response status.
pub static REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "model_service_requests_total",
        "Total number of endpoint requests, labeled by route and status",
        &["route", "status"]
    )
    .expect("Failed to create model_service_requests_total counter vec")
});

/// Histogram of endpoint invocation durations in seconds.
pub static INVOCATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "model_service_invocation_duration_seconds",
        "Endpoint invocation durations in seconds",
        &["route", "result"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create invocation duration histogram")
});

/// Requests rejected because the body did not match the parameter schema.
pub static VALIDATION_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "model_service_validation_failures_total",
        "Total number of requests rejected by parameter validation, labeled by route",
        &["route"]
    )
    .expect("Failed to create validation failures counter vec")
});

/// Outcome of an endpoint invocation, used as a metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationResult {
    /// The endpoint returned a value
    Success,
    /// The endpoint raised a 4xx error
    ClientError,
    /// The endpoint failed internally
    Error,
}

impl InvocationResult {
    /// Label value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ClientError => "client_error",
            Self::Error => "error",
        }
    }
}

/// Count a request to `route` answered with `status`
pub fn inc_requests(route: &str, status: StatusCode) {
    REQUESTS
        .with_label_values(&[route, status.as_str()])
        .inc();
}

/// Observe the duration of an endpoint invocation
///
/// # Arguments
/// * `route` - Route path
/// * `result` - Outcome of the invocation
/// * `duration_secs` - The duration of the invocation in seconds
pub fn observe_invocation_duration(route: &str, result: InvocationResult, duration_secs: f64) {
    INVOCATION_DURATION
        .with_label_values(&[route, result.as_str()])
        .observe(duration_secs);
}

/// Count a validation failure on `route`
pub fn inc_validation_failures(route: &str) {
    VALIDATION_FAILURES.with_label_values(&[route]).inc();
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
