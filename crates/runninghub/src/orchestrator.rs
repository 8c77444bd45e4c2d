//! Caller-facing task orchestration.
//!
//! [`Orchestrator`] is the small function-call surface the surrounding
//! application uses: [`submit_job`](Orchestrator::submit_job),
//! [`poll_until_done`](Orchestrator::poll_until_done) (submit + poll +
//! resolve), [`wait_for_task`](Orchestrator::wait_for_task) (re-poll an
//! earlier submission), and [`cancel_job`](Orchestrator::cancel_job).
//!
//! Region ids are resolved once at the call boundary, before any network
//! I/O. The orchestrator holds no per-job state, so it can be shared
//! behind an `Arc` and used for many concurrent jobs across regions.
//!
//! Lifecycle events are broadcast via a [`tokio::sync::broadcast`]
//! channel. Call [`Orchestrator::subscribe`] to receive them.

use chrono::Utc;
use photofx_core::job::Job;
use photofx_core::submission::{JobSpec, JobSubmission};
use photofx_core::types::Timestamp;
use photofx_core::{RegionConfig, RegionRouter, TaskError, TaskId};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::api::{ClientTimeouts, TaskApi, TaskClient};
use crate::backoff::{PollConfig, PollOverrides};
use crate::config::OrchestratorConfig;
use crate::events::JobEvent;
use crate::poller::PollingOrchestrator;

/// Broadcast channel capacity for job events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A task the provider accepted.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub task_id: TaskId,
    pub region: RegionConfig,
    pub submitted_at: Timestamp,
}

/// Entry point for submitting, polling, and cancelling provider tasks.
pub struct Orchestrator {
    router: RegionRouter,
    http: reqwest::Client,
    api_key: String,
    timeouts: ClientTimeouts,
    poll: PollConfig,
    event_tx: broadcast::Sender<JobEvent>,
}

impl Orchestrator {
    /// Create an orchestrator over a region table.
    pub fn new(
        router: RegionRouter,
        api_key: impl Into<String>,
        timeouts: ClientTimeouts,
        poll: PollConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            router,
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            timeouts,
            poll,
            event_tx,
        }
    }

    /// Create an orchestrator over the production regions.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(
            RegionRouter::default(),
            config.api_key.clone(),
            config.timeouts,
            config.poll.clone(),
        )
    }

    /// Subscribe to job lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    pub fn router(&self) -> &RegionRouter {
        &self.router
    }

    /// Build a [`TaskClient`] bound to `region_id`, sharing the pooled
    /// HTTP client.
    pub fn client_for(&self, region_id: &str) -> Result<TaskClient, TaskError> {
        let region = self.router.resolve(region_id)?;
        Ok(TaskClient::with_client(
            self.http.clone(),
            region.clone(),
            self.api_key.clone(),
            self.timeouts,
        ))
    }

    /// Normalize and submit a job. Returns once the provider has issued a
    /// task id; does not wait for the task.
    pub async fn submit_job(
        &self,
        region_id: &str,
        spec: &JobSpec,
    ) -> Result<SubmittedJob, TaskError> {
        let client = self.client_for(region_id)?;
        self.submit_with(&client, spec).await
    }

    /// Submit a job and poll it to completion, returning absolute result URLs.
    ///
    /// Region, parameters, and poll overrides are all validated before
    /// anything is submitted.
    ///
    /// Cancelling `cancel` stops polling at the next boundary, asks the
    /// provider to cancel the task, and returns
    /// [`TaskError::OperationCancelled`].
    pub async fn poll_until_done(
        &self,
        region_id: &str,
        spec: &JobSpec,
        overrides: PollOverrides,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TaskError> {
        let client = self.client_for(region_id)?;
        let config = self.poll.with_overrides(&overrides)?;
        let submitted = self.submit_with(&client, spec).await?;
        let mut job = Job::new(
            submitted.task_id,
            submitted.region.id(),
            submitted.submitted_at,
        );
        self.poller(client, config).run(&mut job, cancel).await
    }

    /// Poll a task submitted earlier (e.g. after a
    /// [`TaskError::PollingTimeout`]) and resolve its results.
    pub async fn wait_for_task(
        &self,
        region_id: &str,
        task_id: &TaskId,
        overrides: PollOverrides,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TaskError> {
        let client = self.client_for(region_id)?;
        let config = self.poll.with_overrides(&overrides)?;
        let mut job = Job::new(task_id.clone(), region_id, Utc::now());
        self.poller(client, config).run(&mut job, cancel).await
    }

    /// Ask the provider to cancel a task.
    ///
    /// A task that already reached a terminal state yields the provider's
    /// error (typically [`TaskError::Provider`]), never a silent success.
    pub async fn cancel_job(&self, region_id: &str, task_id: &TaskId) -> Result<bool, TaskError> {
        let client = self.client_for(region_id)?;
        let cancelled = client.cancel(task_id).await?;
        if cancelled {
            let _ = self.event_tx.send(JobEvent::Cancelled {
                task_id: task_id.clone(),
                region_id: region_id.to_string(),
                by_caller: true,
            });
        }
        Ok(cancelled)
    }

    // ---- private helpers ----

    async fn submit_with(
        &self,
        client: &TaskClient,
        spec: &JobSpec,
    ) -> Result<SubmittedJob, TaskError> {
        let region = client.region();
        let submission = JobSubmission::from_spec(region.id(), spec)?;
        let task_id = client.submit(&submission).await?;
        let submitted_at = Utc::now();

        let _ = self.event_tx.send(JobEvent::Submitted {
            task_id: task_id.clone(),
            region_id: region.id().to_string(),
            target: spec.target.kind(),
        });

        Ok(SubmittedJob {
            task_id,
            region: region.clone(),
            submitted_at,
        })
    }

    fn poller(&self, client: TaskClient, config: PollConfig) -> PollingOrchestrator<TaskClient> {
        PollingOrchestrator::with_tokio_clock(client, config).with_events(self.event_tx.clone())
    }
}
