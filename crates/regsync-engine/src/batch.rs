//! Batch runner
//!
//! The top-level resilience boundary of every agent: drives a handler
//! over a list of source rows, isolating per-row failures into the
//! error-report side channel. No row's failure may prevent subsequent
//! rows from being attempted; a synchronization job must make forward
//! progress despite individual bad or stale records.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use regsync_connector::{ErrorReport, ErrorReporter, SyncError, SyncResult};

/// Batch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Width of the bounded worker pool used for the parallel phase.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    // The legacy importer's pool width for the independent
    // new-customer phase.
    15
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// One recorded row failure.
#[derive(Debug)]
pub struct RowFailure<R> {
    pub row: R,
    pub code: &'static str,
    pub reason: String,
}

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchReport<R> {
    /// Rows attempted (succeeded + failed).
    pub processed: usize,
    pub succeeded: usize,
    pub failed: Vec<RowFailure<R>>,
    /// True when cooperative cancellation stopped the run before all
    /// rows were attempted.
    pub cancelled: bool,
}

impl<R> BatchReport<R> {
    fn empty() -> Self {
        Self {
            processed: 0,
            succeeded: 0,
            failed: Vec::new(),
            cancelled: false,
        }
    }
}

/// Drives row handlers with per-row failure isolation.
pub struct BatchRunner {
    source: String,
    reporter: Arc<dyn ErrorReporter>,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    /// Create a runner reporting failures under the given source name.
    pub fn new(source: impl Into<String>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            source: source.into(),
            reporter,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for requesting cooperative cancellation; checked between
    /// rows, so the row in flight always completes.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Request cancellation.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run the handler over each row in order.
    ///
    /// Every failure is recorded and reported; none propagates.
    #[instrument(skip(self, rows, handler), fields(source = %self.source))]
    pub async fn run<R, F, Fut>(&self, rows: Vec<R>, handler: F) -> BatchReport<R>
    where
        R: Serialize + Clone,
        F: Fn(R) -> Fut,
        Fut: std::future::Future<Output = SyncResult<()>>,
    {
        let total = rows.len();
        let mut report = BatchReport::empty();

        for row in rows {
            if self.is_cancelled() {
                info!(
                    attempted = report.processed,
                    total = total,
                    "batch cancelled, stopping between rows"
                );
                report.cancelled = true;
                break;
            }

            report.processed += 1;
            match handler(row.clone()).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => self.record_failure(&mut report, row, &e).await,
            }
        }

        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }

    /// Run the handler over independent rows through a bounded worker
    /// pool. Same isolation contract as [`run`](Self::run); row order
    /// in the report is not preserved for failures.
    #[instrument(skip(self, rows, handler), fields(source = %self.source))]
    pub async fn run_concurrent<R, F, Fut>(
        &self,
        rows: Vec<R>,
        width: usize,
        handler: F,
    ) -> BatchReport<R>
    where
        R: Serialize + Clone + Send + 'static,
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = SyncResult<()>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(width.max(1)));
        let handler = Arc::new(handler);
        let mut report = BatchReport::empty();
        let mut handles = Vec::with_capacity(rows.len());

        for row in rows {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };
            let handler = handler.clone();
            let task_row = row.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                handler(task_row).await
            });
            handles.push((row, handle));
        }

        for (row, handle) in handles {
            report.processed += 1;
            match handle.await {
                Ok(Ok(())) => report.succeeded += 1,
                Ok(Err(e)) => self.record_failure(&mut report, row, &e).await,
                Err(join_error) => {
                    let e = SyncError::internal(format!("row handler aborted: {join_error}"));
                    self.record_failure(&mut report, row, &e).await;
                }
            }
        }

        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }

    async fn record_failure<R: Serialize>(
        &self,
        report: &mut BatchReport<R>,
        row: R,
        error: &SyncError,
    ) {
        warn!(
            source = %self.source,
            code = error.error_code(),
            error = %error,
            "row failed, continuing batch"
        );

        self.reporter
            .report(
                ErrorReport::new(self.source.clone(), error.to_string())
                    .with_object(serde_json::to_value(&row).unwrap_or(serde_json::Value::Null)),
            )
            .await;

        report.failed.push(RowFailure {
            row,
            code: error.error_code(),
            reason: error.to_string(),
        });
    }
}
