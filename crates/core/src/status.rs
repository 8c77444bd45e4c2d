//! Task status values and the monotonic lifecycle state machine.
//!
//! ```text
//! PENDING -> RUNNING -> { SUCCESS, FAILED, CANCELLED }
//!    \___________________________/^
//! ```
//!
//! `PENDING` may be skipped. Terminal states have no outgoing transitions.

use serde::Serialize;

/// Lifecycle state of a remote task as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Canonical wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse a provider status string, accepting known synonyms.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "QUEUED" | "WAITING" | "CREATE" => Some(TaskStatus::Pending),
            "RUNNING" | "PROCESSING" | "IN_PROGRESS" => Some(TaskStatus::Running),
            "SUCCESS" | "SUCCEED" | "SUCCEEDED" | "COMPLETED" => Some(TaskStatus::Success),
            "FAILED" | "FAILURE" | "ERROR" => Some(TaskStatus::Failed),
            "CANCELLED" | "CANCELED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Position in the lifecycle; all terminal states share the last rank.
    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Running => 1,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::Cancelled => 2,
        }
    }

    /// Check whether moving from `self` to `next` is a forward transition.
    ///
    /// Staying in the same status is not a transition and returns `false`.
    pub fn can_transition(&self, next: TaskStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
