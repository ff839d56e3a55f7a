// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Slack incoming webhook reporter
//!
//! Posts `{"text": ":boom: SEVERITY: message"}` to a webhook URL. Transport
//! errors, timeouts, rate limits and 5xx answers are retried with exponential
//! backoff and jitter; other rejections fail immediately.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use tokio_retry::{
    RetryIf,
    strategy::{ExponentialBackoff, jitter},
};
use tracing::{debug, warn};
use url::Url;

use crate::{ErrorReport, ReportingError};

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;
// Delays grow as 100ms, 200ms, 400ms, ... before jitter.
const BACKOFF_BASE_MILLIS: u64 = 2;
const BACKOFF_FACTOR_MILLIS: u64 = 50;
const MAX_BACKOFF: Duration = Duration::from_secs(5);
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Configuration for the Slack webhook reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    /// Incoming webhook URL
    pub webhook_url: Url,
    /// Per-attempt request timeout in seconds
    pub timeout_seconds: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
}

impl SlackConfig {
    /// Configuration with default timeout and retry budget
    pub fn new(webhook_url: Url) -> Self {
        Self {
            webhook_url,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the retry budget
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Delivers error reports to a Slack incoming webhook
#[derive(Debug, Clone)]
pub struct SlackReporter {
    client: Client,
    config: SlackConfig,
}

impl SlackReporter {
    /// Create a new reporter
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero, the URL is not HTTP(S), or the
    /// HTTP client cannot be built.
    pub fn new(config: SlackConfig) -> Result<Self, ReportingError> {
        if config.timeout_seconds == 0 {
            return Err(ReportingError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if !matches!(config.webhook_url.scheme(), "http" | "https") {
            return Err(ReportingError::Config(format!(
                "webhook URL must use http or https, got '{}'",
                config.webhook_url.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("model-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Configured webhook URL
    pub fn webhook_url(&self) -> &Url {
        &self.config.webhook_url
    }

    /// Post `report` to the webhook
    ///
    /// # Errors
    ///
    /// Returns the last delivery error once the retry budget is exhausted, or
    /// the first non-retryable rejection.
    pub async fn report(&self, report: &ErrorReport) -> Result<(), ReportingError> {
        let payload = json!({ "text": report.render() });
        let strategy = ExponentialBackoff::from_millis(BACKOFF_BASE_MILLIS)
            .factor(BACKOFF_FACTOR_MILLIS)
            .max_delay(MAX_BACKOFF)
            .map(jitter)
            .take(self.config.max_retries as usize);

        RetryIf::spawn(
            strategy,
            || self.post_once(&payload),
            ReportingError::is_transient,
        )
        .await
    }

    async fn post_once(&self, payload: &serde_json::Value) -> Result<(), ReportingError> {
        debug!(url = %self.config.webhook_url, "posting error report to Slack");

        let response = self
            .client
            .post(self.config.webhook_url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ReportingError::Timeout {
                        seconds: self.config.timeout_seconds,
                    }
                } else {
                    ReportingError::Http(error)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY_CHARS {
            let cut = body
                .char_indices()
                .nth(MAX_ERROR_BODY_CHARS)
                .map_or(body.len(), |(index, _)| index);
            body.truncate(cut);
        }

        if Self::should_retry_status(status) {
            warn!(
                status = status.as_u16(),
                "Slack webhook failed with retryable status"
            );
        }

        Err(ReportingError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Whether a webhook answer is worth retrying
    fn should_retry_status(status: StatusCode) -> bool {
        status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
    }
}

impl ReportingError {
    /// Whether the failure may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Rejected { status, .. } => {
                StatusCode::from_u16(*status).is_ok_and(SlackReporter::should_retry_status)
            }
            Self::Config(_) | Self::InvalidSeverity(_) => false,
        }
    }
}
