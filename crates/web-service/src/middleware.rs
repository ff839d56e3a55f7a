// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! Responses produced from internal failures carry a [`ReportedError`]
//! extension. The middleware here strips it, hands the message to the
//! configured error reporters and tells the caller when the team was
//! notified. Delivery is bounded by what is left of the request timeout.

use std::time::Duration;

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use error_reporting::ErrorReport;
use serde_json::json;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::{
    error::{INTERNAL_ERROR_DETAIL, ReportedError, TEAM_NOTIFIED_SUFFIX},
    state::ServerState,
};

/// Time kept back from the request timeout to send the response itself
const RESPONSE_MARGIN: Duration = Duration::from_millis(250);

/// Error reporting middleware function
pub async fn error_reporting_middleware(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Response {
    let deadline = Instant::now() + state.config().timeout_seconds.value();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;
    let Some(reported) = response.extensions_mut().remove::<ReportedError>() else {
        return response;
    };

    let reporters = state.reporters();
    let budget = deadline
        .saturating_duration_since(Instant::now())
        .saturating_sub(RESPONSE_MARGIN);
    let delivery = reporters.report(ErrorReport::new(format!(
        "{method} {path}: {}",
        reported.message
    )));
    match timeout(budget, delivery).await {
        Ok(failures) if !failures.is_empty() => {
            debug!(failures = failures.len(), "error report was not delivered everywhere");
        }
        Ok(_) => {}
        Err(_) => warn!(
            budget_ms = budget.as_millis(),
            "error report delivery cut short by the request timeout"
        ),
    }

    if reported.generic_detail && reporters.notifies_team() {
        let status = response.status();
        let mut notified = Json(json!({
            "detail": format!("{INTERNAL_ERROR_DETAIL}{TEAM_NOTIFIED_SUFFIX}")
        }))
        .into_response();
        *notified.status_mut() = status;
        return notified;
    }

    response
}
