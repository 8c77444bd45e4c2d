//! The closed error vocabulary shared by the task client and the poller.
//!
//! Every failure surfaced to a caller is exactly one [`TaskError`] variant.
//! Only [`TaskError::TransientNetwork`] is ever retried, and only by the
//! polling loop.

use std::time::Duration;

use crate::ids::TaskId;
use crate::status::TaskStatus;

/// Errors produced while submitting, polling, resolving, or cancelling a task.
///
/// The type is `Clone` (it carries only strings and plain data) so the
/// per-job record can keep a copy of its terminal error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// The region id is not in the configured region table.
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// The caller's input, or the provider's validation, rejected a parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The referenced app, workflow, or task does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout, connection reset, or a gateway-level HTTP failure.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// A non-zero provider code with no more specific mapping.
    #[error("Provider error ({code}): {message}")]
    Provider {
        /// Provider `code` field, or the HTTP status for transport-level errors.
        code: i64,
        /// Provider `msg` field or response body.
        message: String,
    },

    /// The remote task reached `FAILED`.
    #[error("Task {task_id} failed: {}", .message.as_deref().unwrap_or("no detail from provider"))]
    TaskFailed {
        task_id: TaskId,
        message: Option<String>,
    },

    /// The remote task reached `CANCELLED` without a local cancellation.
    #[error("Task {task_id} was cancelled by the provider")]
    TaskCancelled { task_id: TaskId },

    /// The local deadline passed (or transient failures were exhausted)
    /// before a terminal status was observed. The task may still be running.
    #[error(
        "Polling task {task_id} timed out after {}s (last status: {})",
        .elapsed.as_secs(),
        status_label(.last_status)
    )]
    PollingTimeout {
        task_id: TaskId,
        last_status: Option<TaskStatus>,
        elapsed: Duration,
    },

    /// The caller cancelled the operation locally.
    #[error("Operation on task {task_id} was cancelled")]
    OperationCancelled { task_id: TaskId },
}

fn status_label(status: &Option<TaskStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("unknown")
}

impl TaskError {
    /// Whether the polling loop may retry the call that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::TransientNetwork(_))
    }

    /// Stable machine-readable code for the surrounding application.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::UnknownRegion(_) => "UNKNOWN_REGION",
            TaskError::InvalidParameter(_) => "INVALID_PARAMETER",
            TaskError::NotFound(_) => "NOT_FOUND",
            TaskError::TransientNetwork(_) => "TRANSIENT_NETWORK",
            TaskError::Provider { .. } => "PROVIDER_ERROR",
            TaskError::TaskFailed { .. } => "TASK_FAILED",
            TaskError::TaskCancelled { .. } => "TASK_CANCELLED",
            TaskError::PollingTimeout { .. } => "POLLING_TIMEOUT",
            TaskError::OperationCancelled { .. } => "OPERATION_CANCELLED",
        }
    }

    /// Whether a caller could reasonably show "try again".
    ///
    /// True for network trouble and local timeouts; false for rejected
    /// input, missing entities, and terminal task outcomes.
    pub fn is_worth_retrying_later(&self) -> bool {
        matches!(
            self,
            TaskError::TransientNetwork(_) | TaskError::PollingTimeout { .. }
        )
    }
}
