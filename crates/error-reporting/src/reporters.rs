// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Registry of configured error reporters

use tracing::{error, warn};

use crate::{ErrorReport, ReportingError, SlackReporter};

/// The set of sinks an internal error is reported to
///
/// Every report is logged. Delivery to remote sinks is best effort: failures
/// are logged and swallowed so that reporting never masks the original error.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporters {
    message_prefix: String,
    slack: Option<SlackReporter>,
}

impl ErrorReporters {
    /// Reporters that only log
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporters with an optional Slack sink
    pub fn with_slack(slack: Option<SlackReporter>) -> Self {
        Self {
            message_prefix: String::new(),
            slack,
        }
    }

    /// Prepend `prefix` to every reported message
    #[must_use]
    pub fn with_message_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.message_prefix = prefix.into();
        self
    }

    /// Whether reports reach a human channel
    pub fn notifies_team(&self) -> bool {
        self.slack.is_some()
    }

    /// Prefix applied to reported messages
    pub fn message_prefix(&self) -> &str {
        &self.message_prefix
    }

    /// Log `report` and deliver it to every configured sink
    ///
    /// Returns the delivery errors that occurred, which have already been
    /// logged.
    pub async fn report(&self, report: ErrorReport) -> Vec<ReportingError> {
        let report = ErrorReport {
            message: format!("{}{}", self.message_prefix, report.message),
            ..report
        };

        error!(severity = %report.severity, "{}", report.message);

        let mut failures = Vec::new();
        if let Some(slack) = &self.slack
            && let Err(e) = slack.report(&report).await
        {
            warn!(error = %e, "encountered error while reporting error to Slack");
            failures.push(e);
        }
        failures
    }
}
