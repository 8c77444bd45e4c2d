//! Status polling loop.
//!
//! [`PollingOrchestrator`] drives one submitted task to a terminal outcome:
//!
//! 1. check the cancellation token;
//! 2. issue exactly one status call (never overlapping for a task);
//! 3. `SUCCESS` fetches and resolves outputs; `FAILED` asks once for the
//!    provider's failure reason, then it and `CANCELLED` end with a typed
//!    error; a transient failure is counted and retried;
//! 4. stop with [`TaskError::PollingTimeout`] once the deadline passes
//!    (a timeout beyond what `Instant` can represent means no deadline);
//! 5. sleep for the jittered interval, waking early on cancellation.
//!
//! Cancellation is cooperative and observed only between status calls. It
//! triggers a best-effort remote cancel and ends with
//! [`TaskError::OperationCancelled`].

use std::time::Instant;

use chrono::Utc;
use photofx_core::job::{Job, StatusChange};
use photofx_core::result::resolve_result_urls;
use photofx_core::{TaskError, TaskStatus};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::api::TaskApi;
use crate::backoff::{jittered, next_interval, PollConfig};
use crate::clock::{Clock, TokioClock};
use crate::events::JobEvent;

/// Polls one region's task API until a task is done.
///
/// Holds no per-task state, so one instance can drive many tasks
/// concurrently; each call to [`run`](Self::run) owns its own loop.
pub struct PollingOrchestrator<A, C = TokioClock> {
    api: A,
    clock: C,
    config: PollConfig,
    events: Option<broadcast::Sender<JobEvent>>,
}

impl<A: TaskApi> PollingOrchestrator<A, TokioClock> {
    /// Poller on the real tokio clock.
    pub fn with_tokio_clock(api: A, config: PollConfig) -> Self {
        Self::new(api, TokioClock, config)
    }
}

impl<A: TaskApi, C: Clock> PollingOrchestrator<A, C> {
    pub fn new(api: A, clock: C, config: PollConfig) -> Self {
        Self {
            api,
            clock,
            config,
            events: None,
        }
    }

    /// Publish lifecycle events on `tx`.
    pub fn with_events(mut self, tx: broadcast::Sender<JobEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `job` to a terminal outcome and resolve its output URLs.
    ///
    /// On success the URLs are stored on the job and returned. On failure
    /// the error is stored on the job and returned; no error is swallowed.
    pub async fn run(
        &self,
        job: &mut Job,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TaskError> {
        let outcome = match self.wait_for_success(job, cancel).await {
            Ok(()) => self.fetch_results(job).await,
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(urls) => {
                job.set_result_urls(urls.clone());
                tracing::info!(
                    task_id = %job.task_id(),
                    region = %job.region_id(),
                    result_count = urls.len(),
                    "Task completed",
                );
                self.emit(JobEvent::Completed {
                    task_id: job.task_id().clone(),
                    region_id: job.region_id().to_string(),
                    result_urls: urls.clone(),
                });
            }
            Err(e) => {
                job.set_error(e.clone());
                self.emit_failure(job, e);
            }
        }

        outcome
    }

    // ---- private helpers ----

    /// Loop until `SUCCESS`, or return the error that ends polling.
    async fn wait_for_success(
        &self,
        job: &mut Job,
        cancel: &CancellationToken,
    ) -> Result<(), TaskError> {
        self.config.validate()?;

        let started = self.clock.now();
        // A timeout too large for `Instant` means no deadline.
        let deadline = started.checked_add(self.config.timeout);
        let mut interval = self.config.initial_interval;
        let mut consecutive_transient = 0u32;
        let mut poll_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancel_remote(job).await);
            }

            poll_count += 1;
            match self.api.get_status(job.task_id()).await {
                Ok(observed) => {
                    consecutive_transient = 0;
                    self.apply_status(job, observed);
                    match job.status() {
                        TaskStatus::Success => return Ok(()),
                        TaskStatus::Failed => {
                            let message = self
                                .api
                                .failure_reason(job.task_id())
                                .await
                                .unwrap_or_else(|| {
                                    format!(
                                        "provider reported FAILED after {poll_count} status checks"
                                    )
                                });
                            return Err(TaskError::TaskFailed {
                                task_id: job.task_id().clone(),
                                message: Some(message),
                            });
                        }
                        TaskStatus::Cancelled => {
                            return Err(TaskError::TaskCancelled {
                                task_id: job.task_id().clone(),
                            });
                        }
                        TaskStatus::Pending | TaskStatus::Running => {}
                    }
                }
                Err(e) if e.is_retryable() => {
                    consecutive_transient += 1;
                    tracing::warn!(
                        task_id = %job.task_id(),
                        attempt = consecutive_transient,
                        max_retries = self.config.max_transient_retries,
                        error = %e,
                        "Transient error polling task status",
                    );
                    if consecutive_transient > self.config.max_transient_retries {
                        tracing::error!(
                            task_id = %job.task_id(),
                            "Giving up after repeated transient status failures",
                        );
                        return Err(self.timeout_error(job, started));
                    }
                }
                Err(e) => return Err(e),
            }

            let now = self.clock.now();
            let mut delay = jittered(interval, self.config.jitter);
            if let Some(deadline) = deadline {
                if now >= deadline {
                    return Err(self.timeout_error(job, started));
                }
                delay = delay.min(deadline - now);
            }
            tracing::trace!(
                task_id = %job.task_id(),
                delay_ms = delay.as_millis() as u64,
                "Waiting before next status check",
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancel_remote(job).await),
                _ = self.clock.sleep(delay) => {}
            }

            interval = next_interval(interval, &self.config);
        }
    }

    /// Record an observed status on the job and publish forward moves.
    fn apply_status(&self, job: &mut Job, observed: TaskStatus) {
        match job.record_poll(observed, Utc::now()) {
            StatusChange::Advanced { from, to } => {
                tracing::info!(task_id = %job.task_id(), %from, %to, "Task status changed");
                self.emit(JobEvent::StatusChanged {
                    task_id: job.task_id().clone(),
                    from,
                    to,
                });
            }
            StatusChange::Unchanged => {
                tracing::debug!(task_id = %job.task_id(), status = %observed, "Task status unchanged");
            }
            StatusChange::Ignored { current, observed } => {
                tracing::debug!(
                    task_id = %job.task_id(),
                    %current,
                    %observed,
                    "Ignoring backwards status report",
                );
            }
        }
    }

    async fn fetch_results(&self, job: &Job) -> Result<Vec<String>, TaskError> {
        let raw = self.api.get_result(job.task_id()).await?;
        let urls = resolve_result_urls(&raw, self.api.region());
        if urls.is_empty() {
            tracing::warn!(task_id = %job.task_id(), raw = %raw, "Task succeeded with no asset outputs");
        }
        Ok(urls)
    }

    /// Best-effort remote cancel after a local cancellation request.
    ///
    /// A failed remote cancel is logged; the caller still gets
    /// [`TaskError::OperationCancelled`].
    async fn cancel_remote(&self, job: &Job) -> TaskError {
        tracing::info!(task_id = %job.task_id(), "Cancellation requested, cancelling remote task");
        if let Err(e) = self.api.cancel(job.task_id()).await {
            tracing::warn!(
                task_id = %job.task_id(),
                error = %e,
                "Remote cancel failed; task may keep running",
            );
        }
        TaskError::OperationCancelled {
            task_id: job.task_id().clone(),
        }
    }

    fn timeout_error(&self, job: &Job, started: Instant) -> TaskError {
        TaskError::PollingTimeout {
            task_id: job.task_id().clone(),
            last_status: Some(job.status()),
            elapsed: self.clock.now().saturating_duration_since(started),
        }
    }

    fn emit_failure(&self, job: &Job, error: &TaskError) {
        let task_id = job.task_id().clone();
        let region_id = job.region_id().to_string();
        let event = match error {
            TaskError::OperationCancelled { .. } => JobEvent::Cancelled {
                task_id,
                region_id,
                by_caller: true,
            },
            TaskError::TaskCancelled { .. } => JobEvent::Cancelled {
                task_id,
                region_id,
                by_caller: false,
            },
            TaskError::PollingTimeout { .. } => {
                tracing::warn!(task_id = %task_id, error = %error, "Task polling timed out");
                JobEvent::TimedOut {
                    task_id,
                    region_id,
                    last_status: job.status(),
                }
            }
            other => {
                tracing::error!(task_id = %task_id, error = %other, "Task failed");
                JobEvent::Failed {
                    task_id,
                    region_id,
                    code: other.code(),
                    error: other.to_string(),
                }
            }
        };
        self.emit(event);
    }

    fn emit(&self, event: JobEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine.
            let _ = tx.send(event);
        }
    }
}
