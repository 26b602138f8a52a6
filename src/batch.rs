//! Selection-driven batch operations.
//!
//! A batch runs one operation per selected id, reports progress after every
//! row and collects per-row failures instead of aborting. [`spawn_batch`]
//! moves the loop to a blocking worker and streams [`BatchEvent`]s back
//! over a channel; the caller owns all presentation.

use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::PayrollResult;

/// A row that failed, with the error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// The id of the row.
    pub id: i64,
    /// Why it failed.
    pub message: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Ids processed successfully, in processing order.
    pub succeeded: Vec<i64>,
    /// Ids that failed.
    pub failed: Vec<BatchFailure>,
    /// True when the batch stopped early on cancellation.
    pub cancelled: bool,
}

impl BatchReport {
    /// True when every selected row succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    /// One-line status message naming the failed ids.
    ///
    /// # Example
    ///
    /// ```
    /// use paie_engine::batch::{BatchFailure, BatchReport};
    ///
    /// let report = BatchReport {
    ///     succeeded: vec![1, 2],
    ///     failed: vec![BatchFailure { id: 7, message: "no motif".to_string() }],
    ///     cancelled: false,
    /// };
    /// assert_eq!(report.summary(), "2 succeeded, 1 failed (ids: 7)");
    /// ```
    pub fn summary(&self) -> String {
        let mut summary = if self.failed.is_empty() {
            format!("{} succeeded", self.succeeded.len())
        } else {
            let ids: Vec<String> = self.failed.iter().map(|f| f.id.to_string()).collect();
            format!(
                "{} succeeded, {} failed (ids: {})",
                self.succeeded.len(),
                self.failed.len(),
                ids.join(", ")
            )
        };
        if self.cancelled {
            summary.push_str(", cancelled");
        }
        summary
    }
}

/// Progress notifications of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// The batch started with this many rows.
    Started {
        /// Rows to process.
        total: usize,
    },
    /// A row finished, successfully or not.
    Progress {
        /// Rows finished so far.
        done: usize,
        /// Rows to process.
        total: usize,
        /// The row just finished.
        id: i64,
    },
    /// A row failed. Always followed by the row's `Progress`.
    Failed {
        /// The row.
        id: i64,
        /// Why it failed.
        message: String,
    },
    /// The batch ended.
    Finished(BatchReport),
}

/// Runs `op` for each selected id, in order, skipping duplicates.
///
/// Events go to `sink` as they happen. Cancellation is checked between rows.
pub fn run_batch<F, S>(
    ids: &[i64],
    cancel: &CancellationToken,
    mut op: F,
    mut sink: S,
) -> BatchReport
where
    F: FnMut(i64) -> PayrollResult<()>,
    S: FnMut(BatchEvent),
{
    let mut seen = HashSet::new();
    let selected: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    let total = selected.len();
    let mut report = BatchReport::default();

    info!(total, "Batch started");
    sink(BatchEvent::Started { total });

    for (index, id) in selected.into_iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            warn!(done = index, total, "Batch cancelled");
            break;
        }
        match op(id) {
            Ok(()) => report.succeeded.push(id),
            Err(err) => {
                warn!(id, error = %err, "Batch row failed");
                let message = err.to_string();
                sink(BatchEvent::Failed {
                    id,
                    message: message.clone(),
                });
                report.failed.push(BatchFailure { id, message });
            }
        }
        sink(BatchEvent::Progress {
            done: index + 1,
            total,
            id,
        });
    }

    info!(summary = %report.summary(), "Batch finished");
    sink(BatchEvent::Finished(report.clone()));
    report
}

/// Runs [`run_batch`] on a blocking worker.
///
/// Events stream over the returned receiver; the join handle yields the
/// final report. Dropping the receiver does not stop the batch, cancel the
/// token for that.
pub fn spawn_batch<F>(
    ids: Vec<i64>,
    cancel: CancellationToken,
    op: F,
) -> (JoinHandle<BatchReport>, mpsc::UnboundedReceiver<BatchEvent>)
where
    F: FnMut(i64) -> PayrollResult<()> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::task::spawn_blocking(move || {
        run_batch(&ids, &cancel, op, |event| {
            // A closed receiver only means nobody is watching.
            let _ = tx.send(event);
        })
    });
    (handle, rx)
}
