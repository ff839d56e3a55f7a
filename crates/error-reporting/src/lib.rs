// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Reporting of internal service errors
//!
//! This crate notifies a team channel when a service hits an internal error.
//! Reports are formatted as `:boom: {SEVERITY}: {message}` and delivered to a
//! Slack incoming webhook, with retries for transient failures.
//!
//! # Core Abstractions
//!
//! - [`Severity`]: How bad the reported incident is
//! - [`SlackReporter`]: Webhook client delivering a single report
//! - [`ErrorReporters`]: The set of configured sinks; logs every report and
//!   never propagates delivery failures to the caller

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod reporters;
pub mod slack;

pub use reporters::ErrorReporters;
pub use slack::{SlackConfig, SlackReporter};

/// Severity attached to a reported error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Default severity for unexpected internal errors
    #[default]
    Error,
    /// Low impact incident
    Minor,
    /// High impact incident
    Major,
    /// Service is unusable
    Critical,
}

impl Severity {
    /// Wire name of the severity
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Minor => "MINOR",
            Self::Major => "MAJOR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ReportingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Self::Error),
            "MINOR" => Ok(Self::Minor),
            "MAJOR" => Ok(Self::Major),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(ReportingError::InvalidSeverity(other.to_string())),
        }
    }
}

/// An error to be reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Incident description
    pub message: String,
    /// Incident severity
    pub severity: Severity,
}

impl ErrorReport {
    /// Report with the default [`Severity::Error`]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::default(),
        }
    }

    /// Override the severity
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Text posted to the team channel
    pub fn render(&self) -> String {
        format!(":boom: {}: {}", self.severity, self.message)
    }
}

/// Failures while delivering a report
#[derive(Debug, Error)]
pub enum ReportingError {
    /// Transport level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("webhook rejected report: {status} - {body}")]
    Rejected {
        /// Response status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Delivery did not complete in time
    #[error("report delivery timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout
        seconds: u64,
    },

    /// Reporter configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown severity name
    #[error("unknown severity '{0}', expected one of ERROR, MINOR, MAJOR, CRITICAL")]
    InvalidSeverity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_rendering() {
        assert_eq!(
            ErrorReport::new("model crashed").render(),
            ":boom: ERROR: model crashed"
        );
        assert_eq!(
            ErrorReport::new("disk full")
                .with_severity(Severity::Critical)
                .render(),
            ":boom: CRITICAL: disk full"
        );
    }

    #[test]
    fn severity_parsing() {
        assert_eq!("minor".parse::<Severity>().ok(), Some(Severity::Minor));
        assert_eq!("MAJOR".parse::<Severity>().ok(), Some(Severity::Major));
        assert!(matches!(
            "fatal".parse::<Severity>(),
            Err(ReportingError::InvalidSeverity(name)) if name == "FATAL"
        ));
    }

    #[test]
    fn severity_serde() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).ok().as_deref(),
            Some("\"CRITICAL\"")
        );
        assert_eq!(
            serde_json::from_str::<Severity>("\"MINOR\"").ok(),
            Some(Severity::Minor)
        );
    }
}
