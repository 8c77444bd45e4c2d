//! HTTP client for the RunningHub task endpoints.
//!
//! [`TaskClient`] is bound to one region: every request goes to that
//! region's base URL with its `Host` header and a bounded per-call
//! timeout. Failures come back as [`TaskError`] via the shared classifier.
//!
//! The [`TaskApi`] trait is the seam the poller is written against, so a
//! test can drive it with an in-memory fake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use photofx_core::classify::classify_http_status;
use photofx_core::submission::{JobSubmission, JobTarget};
use photofx_core::{RegionConfig, TaskError, TaskId, TaskStatus};
use reqwest::header::HOST;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::wire::{
    failure_reason, status_text, ApiEnvelope, CreateWorkflowTaskRequest, RunAiAppRequest, SubmitData,
    TaskRequest, CANCEL_PATH, CREATE_WORKFLOW_TASK_PATH, OUTPUTS_PATH, RUN_AI_APP_PATH,
    STATUS_PATH,
};

/// Code reported in [`TaskError::Provider`] when the request could not be
/// built at all (malformed URL or header).
const CODE_REQUEST_BUILD: i64 = -1;

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// Submission timeout. The provider validates the whole workflow
    /// synchronously, so this is long.
    pub submit: Duration,
    /// Timeout for status, outputs, and cancel calls.
    pub request: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            submit: Duration::from_secs(60),
            request: Duration::from_secs(15),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskApi
// ---------------------------------------------------------------------------

/// Operations against one region's task endpoints.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// The region this API talks to.
    fn region(&self) -> &RegionConfig;

    /// Submit a normalized job. Returns the provider's task id.
    async fn submit(&self, submission: &JobSubmission) -> Result<TaskId, TaskError>;

    /// One status check.
    async fn get_status(&self, task_id: &TaskId) -> Result<TaskStatus, TaskError>;

    /// The raw outputs payload (`Null` when the provider sends no data).
    async fn get_result(&self, task_id: &TaskId) -> Result<serde_json::Value, TaskError>;

    /// Cancel a task. `Ok(true)` when the provider accepted the request.
    async fn cancel(&self, task_id: &TaskId) -> Result<bool, TaskError>;

    /// Best-effort lookup of why a `FAILED` task failed.
    async fn failure_reason(&self, _task_id: &TaskId) -> Option<String> {
        None
    }
}

#[async_trait]
impl<T: TaskApi + ?Sized> TaskApi for Arc<T> {
    fn region(&self) -> &RegionConfig {
        (**self).region()
    }

    async fn submit(&self, submission: &JobSubmission) -> Result<TaskId, TaskError> {
        (**self).submit(submission).await
    }

    async fn get_status(&self, task_id: &TaskId) -> Result<TaskStatus, TaskError> {
        (**self).get_status(task_id).await
    }

    async fn get_result(&self, task_id: &TaskId) -> Result<serde_json::Value, TaskError> {
        (**self).get_result(task_id).await
    }

    async fn cancel(&self, task_id: &TaskId) -> Result<bool, TaskError> {
        (**self).cancel(task_id).await
    }

    async fn failure_reason(&self, task_id: &TaskId) -> Option<String> {
        (**self).failure_reason(task_id).await
    }
}

// ---------------------------------------------------------------------------
// TaskClient
// ---------------------------------------------------------------------------

/// HTTP client for one region.
#[derive(Clone)]
pub struct TaskClient {
    client: reqwest::Client,
    region: RegionConfig,
    api_key: String,
    timeouts: ClientTimeouts,
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("region", &self.region)
            .field("api_key", &"<redacted>")
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl TaskClient {
    /// Create a client with its own connection pool and default timeouts.
    pub fn new(region: RegionConfig, api_key: impl Into<String>) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            region,
            api_key,
            ClientTimeouts::default(),
        )
    }

    /// Create a client reusing an existing [`reqwest::Client`] (connection
    /// pooling across regions and jobs).
    pub fn with_client(
        client: reqwest::Client,
        region: RegionConfig,
        api_key: impl Into<String>,
        timeouts: ClientTimeouts,
    ) -> Self {
        Self {
            client,
            region,
            api_key: api_key.into(),
            timeouts,
        }
    }

    // ---- private helpers ----

    /// POST a JSON body to `path` and decode the envelope.
    async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<ApiEnvelope<T>, TaskError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.region.endpoint(path);
        tracing::debug!(region = %self.region.id(), url = %url, "RunningHub request");

        let response = self
            .client
            .post(&url)
            .header(HOST, self.region.host_header())
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                region = %self.region.id(),
                path,
                status = status.as_u16(),
                "RunningHub returned non-success HTTP status",
            );
            return Err(classify_http_status(status.as_u16(), &body));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice::<ApiEnvelope<T>>(&bytes).map_err(|e| TaskError::Provider {
            code: i64::from(status.as_u16()),
            message: format!("Undecodable response from {path}: {e}"),
        })
    }

    fn task_request<'a>(&'a self, task_id: &'a TaskId) -> TaskRequest<'a> {
        TaskRequest {
            api_key: &self.api_key,
            task_id,
        }
    }
}

#[async_trait]
impl TaskApi for TaskClient {
    fn region(&self) -> &RegionConfig {
        &self.region
    }

    async fn submit(&self, submission: &JobSubmission) -> Result<TaskId, TaskError> {
        if submission.region_id() != self.region.id() {
            return Err(TaskError::InvalidParameter(format!(
                "Submission for region {} sent to a client bound to {}",
                submission.region_id(),
                self.region.id()
            )));
        }

        let envelope: ApiEnvelope<SubmitData> = match submission.target() {
            JobTarget::AiApp(webapp_id) => {
                let body = RunAiAppRequest {
                    webapp_id,
                    api_key: &self.api_key,
                    node_info_list: submission.node_info_list(),
                };
                self.post(RUN_AI_APP_PATH, &body, self.timeouts.submit)
                    .await?
            }
            JobTarget::Workflow(workflow_id) => {
                let body = CreateWorkflowTaskRequest {
                    workflow_id,
                    api_key: &self.api_key,
                    node_info_list: submission.node_info_list(),
                };
                self.post(CREATE_WORKFLOW_TASK_PATH, &body, self.timeouts.submit)
                    .await?
            }
        };

        let data = envelope.into_result()?.ok_or_else(|| TaskError::Provider {
            code: 0,
            message: "Submit response carried no task id".to_string(),
        })?;

        if let Some(tips) = data.prompt_tips.as_deref().filter(|t| !t.is_empty()) {
            tracing::debug!(task_id = %data.task_id, prompt_tips = %tips, "Provider prompt tips");
        }
        tracing::info!(
            region = %self.region.id(),
            target = submission.target().kind(),
            target_id = %submission.target().id_str(),
            task_id = %data.task_id,
            initial_status = data.task_status.as_deref().unwrap_or("unknown"),
            "Task submitted to RunningHub",
        );

        Ok(data.task_id)
    }

    async fn get_status(&self, task_id: &TaskId) -> Result<TaskStatus, TaskError> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .post(STATUS_PATH, &self.task_request(task_id), self.timeouts.request)
            .await?;
        let data = envelope.into_result()?.unwrap_or(serde_json::Value::Null);

        let text = status_text(&data).ok_or_else(|| TaskError::Provider {
            code: 0,
            message: format!("Status response for task {task_id} carried no status: {data}"),
        })?;
        TaskStatus::parse(text).ok_or_else(|| TaskError::Provider {
            code: 0,
            message: format!("Unrecognised status {text:?} for task {task_id}"),
        })
    }

    async fn get_result(&self, task_id: &TaskId) -> Result<serde_json::Value, TaskError> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .post(OUTPUTS_PATH, &self.task_request(task_id), self.timeouts.request)
            .await?;
        Ok(envelope.into_result()?.unwrap_or(serde_json::Value::Null))
    }

    async fn cancel(&self, task_id: &TaskId) -> Result<bool, TaskError> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .post(CANCEL_PATH, &self.task_request(task_id), self.timeouts.request)
            .await?;
        envelope.into_result()?;
        tracing::info!(region = %self.region.id(), task_id = %task_id, "Task cancelled");
        Ok(true)
    }

    /// The outputs endpoint answers a failed task with a non-zero code and
    /// the reason under `data.failedReason`.
    async fn failure_reason(&self, task_id: &TaskId) -> Option<String> {
        let response = self
            .post::<_, serde_json::Value>(
                OUTPUTS_PATH,
                &self.task_request(task_id),
                self.timeouts.request,
            )
            .await;
        match response {
            Ok(envelope) => failure_reason(&envelope),
            Err(e) => {
                tracing::debug!(task_id = %task_id, error = %e, "Could not fetch failure reason");
                None
            }
        }
    }
}

/// Map a reqwest failure onto the taxonomy.
///
/// Anything that happened on the wire is transient; a request that could
/// not even be built is a provider/configuration error.
fn transport_error(err: reqwest::Error) -> TaskError {
    if err.is_builder() {
        TaskError::Provider {
            code: CODE_REQUEST_BUILD,
            message: format!("Could not build request: {err}"),
        }
    } else {
        TaskError::TransientNetwork(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let t = ClientTimeouts::default();
        assert_eq!(t.submit, Duration::from_secs(60));
        assert_eq!(t.request, Duration::from_secs(15));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = TaskClient::new(
            RegionConfig::new("hongkong", "https://www.runninghub.ai", "www.runninghub.ai"),
            "secret-key",
        );
        let text = format!("{client:?}");
        assert!(!text.contains("secret-key"));
        assert!(text.contains("<redacted>"));
    }

    #[test]
    fn builder_error_is_provider_error() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        match transport_error(req_err) {
            TaskError::Provider { code, .. } => assert_eq!(code, CODE_REQUEST_BUILD),
            other => panic!("Expected Provider, got {other:?}"),
        }
    }
}
