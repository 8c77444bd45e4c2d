//! The ephemeral per-job record.
//!
//! A [`Job`] is created when a submission succeeds and lives only as long
//! as the caller's submit/poll/resolve sequence. The poller updates the
//! status and poll time; result resolution fills in URLs. Nothing here is
//! persisted.

use crate::error::TaskError;
use crate::ids::TaskId;
use crate::status::TaskStatus;
use crate::types::Timestamp;

/// Outcome of applying an observed provider status to a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The job moved forward in its lifecycle.
    Advanced { from: TaskStatus, to: TaskStatus },
    /// The provider repeated the current status.
    Unchanged,
    /// The observation would move the job backwards or out of a terminal
    /// state, and was not applied.
    Ignored { current: TaskStatus, observed: TaskStatus },
}

/// Local view of one remote task.
#[derive(Debug, Clone)]
pub struct Job {
    task_id: TaskId,
    region_id: String,
    status: TaskStatus,
    submitted_at: Timestamp,
    last_polled_at: Option<Timestamp>,
    result_urls: Vec<String>,
    error: Option<TaskError>,
}

impl Job {
    /// A freshly submitted job, in `PENDING`.
    pub fn new(task_id: TaskId, region_id: impl Into<String>, submitted_at: Timestamp) -> Self {
        Self {
            task_id,
            region_id: region_id.into(),
            status: TaskStatus::Pending,
            submitted_at,
            last_polled_at: None,
            result_urls: Vec::new(),
            error: None,
        }
    }

    /// Apply a status observed at `polled_at`.
    ///
    /// The poll time is always recorded; the status only moves forward.
    pub fn record_poll(&mut self, observed: TaskStatus, polled_at: Timestamp) -> StatusChange {
        self.last_polled_at = Some(polled_at);
        if observed == self.status {
            StatusChange::Unchanged
        } else if self.status.can_transition(observed) {
            let from = self.status;
            self.status = observed;
            StatusChange::Advanced { from, to: observed }
        } else {
            StatusChange::Ignored {
                current: self.status,
                observed,
            }
        }
    }

    /// Store the resolved result URLs.
    pub fn set_result_urls(&mut self, urls: Vec<String>) {
        self.result_urls = urls;
    }

    /// Remember the error that ended this job's local lifecycle.
    pub fn set_error(&mut self, error: TaskError) {
        self.error = Some(error);
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub fn last_polled_at(&self) -> Option<Timestamp> {
        self.last_polled_at
    }

    pub fn result_urls(&self) -> &[String] {
        &self.result_urls
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.error.as_ref()
    }

    /// Consume the record, keeping only the result URLs.
    pub fn into_result_urls(self) -> Vec<String> {
        self.result_urls
    }
}
