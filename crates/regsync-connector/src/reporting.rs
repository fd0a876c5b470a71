//! Error reporting channel
//!
//! Fire-and-forget reporting toward operators. The signature is
//! infallible: a failure to report must never mask or replace the
//! original error, so implementations swallow and log their own
//! failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

/// One reported failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// The agent or pipeline that produced the failure.
    pub source: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// The offending row or payload, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,

    pub reported_at: DateTime<Utc>,
}

impl ErrorReport {
    /// Build a report for the given source and message.
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            stack: None,
            object: None,
            reported_at: Utc::now(),
        }
    }

    /// Attach the offending object.
    #[must_use]
    pub fn with_object(mut self, object: serde_json::Value) -> Self {
        self.object = Some(object);
        self
    }

    /// Attach a stack or context trace.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// The error reporting side channel.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// Deliver one report. Must never fail; implementations log and
    /// drop reports they cannot deliver.
    async fn report(&self, report: ErrorReport);
}

/// Reporter that writes structured log events.
///
/// The default channel in dry-run and debug runs, and the fallback
/// when no queue-backed reporter is configured.
#[derive(Debug, Clone, Default)]
pub struct LogReporter;

impl LogReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ErrorReporter for LogReporter {
    async fn report(&self, report: ErrorReport) {
        error!(
            source = %report.source,
            object = ?report.object,
            "{}",
            report.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_builder() {
        let report = ErrorReport::new("kmdee-import", "row rejected")
            .with_object(serde_json::json!({"customer_number": "42"}))
            .with_stack("resolve_chain -> lookup");

        assert_eq!(report.source, "kmdee-import");
        assert_eq!(report.stack.as_deref(), Some("resolve_chain -> lookup"));
        assert!(report.object.is_some());
    }

    #[tokio::test]
    async fn test_log_reporter_never_fails() {
        let reporter = LogReporter::new();
        // Infallible by signature; just exercise the path.
        reporter.report(ErrorReport::new("test", "boom")).await;
    }
}
