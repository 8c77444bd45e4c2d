//! Job lifecycle events.
//!
//! Emitted by the orchestrator and the poller over a
//! [`tokio::sync::broadcast`] channel. Downstream consumers (usage
//! accounting decrements quota on [`JobEvent::Completed`]) subscribe via
//! [`Orchestrator::subscribe`](crate::orchestrator::Orchestrator::subscribe).

use photofx_core::{TaskId, TaskStatus};
use serde::Serialize;

/// A lifecycle event for one remote task.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// The provider accepted a submission.
    Submitted {
        task_id: TaskId,
        region_id: String,
        /// `ai_app` or `workflow`.
        target: &'static str,
    },

    /// The task moved forward in its lifecycle.
    StatusChanged {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The task succeeded and its outputs were resolved.
    Completed {
        task_id: TaskId,
        region_id: String,
        result_urls: Vec<String>,
    },

    /// The task failed remotely, or a non-retryable error ended polling.
    Failed {
        task_id: TaskId,
        region_id: String,
        /// Stable error code (see `TaskError::code`).
        code: &'static str,
        error: String,
    },

    /// The task was cancelled, either by the caller or by the provider.
    Cancelled {
        task_id: TaskId,
        region_id: String,
        by_caller: bool,
    },

    /// The local deadline passed; the task may still be running remotely.
    TimedOut {
        task_id: TaskId,
        region_id: String,
        last_status: TaskStatus,
    },
}

impl JobEvent {
    /// The task this event concerns.
    pub fn task_id(&self) -> &TaskId {
        match self {
            JobEvent::Submitted { task_id, .. }
            | JobEvent::StatusChanged { task_id, .. }
            | JobEvent::Completed { task_id, .. }
            | JobEvent::Failed { task_id, .. }
            | JobEvent::Cancelled { task_id, .. }
            | JobEvent::TimedOut { task_id, .. } => task_id,
        }
    }
}
