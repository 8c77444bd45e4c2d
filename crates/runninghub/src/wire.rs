//! RunningHub OpenAPI request and response types.
//!
//! Every endpoint answers with the envelope `{"code": 0, "msg": "...",
//! "data": ...}`; a non-zero `code` is a failure regardless of the HTTP
//! status. Request bodies borrow from the caller so nothing is cloned on
//! the submit path.

use photofx_core::classify::{classify_provider_response, CODE_SUCCESS};
use photofx_core::ids::{AppId, TaskId, WorkflowId};
use photofx_core::params::NodeFieldAssignment;
use photofx_core::TaskError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Submit a task for a published AI application.
pub const RUN_AI_APP_PATH: &str = "/task/openapi/ai-app/run";
/// Submit a task for a raw workflow.
pub const CREATE_WORKFLOW_TASK_PATH: &str = "/task/openapi/create";
/// Query task status.
pub const STATUS_PATH: &str = "/task/openapi/status";
/// Fetch task outputs.
pub const OUTPUTS_PATH: &str = "/task/openapi/outputs";
/// Cancel a queued or running task.
pub const CANCEL_PATH: &str = "/task/openapi/cancel";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body for [`RUN_AI_APP_PATH`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAiAppRequest<'a> {
    pub webapp_id: &'a AppId,
    pub api_key: &'a str,
    pub node_info_list: &'a [NodeFieldAssignment],
}

/// Body for [`CREATE_WORKFLOW_TASK_PATH`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowTaskRequest<'a> {
    pub workflow_id: &'a WorkflowId,
    pub api_key: &'a str,
    pub node_info_list: &'a [NodeFieldAssignment],
}

/// Body for the status, outputs, and cancel endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest<'a> {
    pub api_key: &'a str,
    pub task_id: &'a TaskId,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Common response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    /// Absent on some error responses; serde treats a missing `Option` as `None`.
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Split the envelope into its data or a classified error.
    pub fn into_result(self) -> Result<Option<T>, TaskError> {
        if self.code == CODE_SUCCESS {
            Ok(self.data)
        } else {
            Err(classify_provider_response(
                self.code,
                self.msg.as_deref().unwrap_or_default(),
            ))
        }
    }
}

/// `data` of a successful submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitData {
    pub task_id: TaskId,
    /// Initial status, when the provider includes it.
    #[serde(default)]
    pub task_status: Option<String>,
    /// Validation notes from the provider's prompt checker.
    #[serde(default)]
    pub prompt_tips: Option<String>,
}

/// Extract the status text from a status response `data`.
///
/// The documented shape is a bare string; an object carrying `status` or
/// `taskStatus` is accepted too.
pub fn status_text(data: &serde_json::Value) -> Option<&str> {
    match data {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(map) => map
            .get("status")
            .or_else(|| map.get("taskStatus"))
            .and_then(serde_json::Value::as_str),
        _ => None,
    }
}

/// Pull a readable failure reason out of an outputs response for a
/// failed task.
///
/// Prefers `data.failedReason` (`exception_message`, plus `node_name` when
/// present); otherwise the `msg` of a non-success envelope.
pub fn failure_reason(envelope: &ApiEnvelope<serde_json::Value>) -> Option<String> {
    let from_data = envelope
        .data
        .as_ref()
        .and_then(|data| data.get("failedReason"))
        .and_then(|reason| match reason {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => {
                let message = map
                    .get("exception_message")
                    .or_else(|| map.get("exceptionMessage"))
                    .and_then(serde_json::Value::as_str)?;
                let node = map
                    .get("node_name")
                    .or_else(|| map.get("nodeName"))
                    .and_then(serde_json::Value::as_str)
                    .filter(|n| !n.is_empty());
                Some(match node {
                    Some(node) => format!("{message} (node {node})"),
                    None => message.to_string(),
                })
            }
            _ => None,
        })
        .filter(|s| !s.trim().is_empty());

    from_data.or_else(|| {
        if envelope.code == CODE_SUCCESS {
            return None;
        }
        envelope.msg.clone().filter(|m| !m.trim().is_empty())
    })
}
