//! `photofx-worker` -- runs one RunningHub image job to completion.
//!
//! Submits the job described by the environment, polls it until it
//! reaches a terminal state, and prints the resolved output URLs as a JSON
//! array on stdout. Ctrl-C cancels the remote task before exiting.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default              | Description                              |
//! |-------------------------|----------|----------------------|------------------------------------------|
//! | `RUNNINGHUB_API_KEY`    | yes      | --                   | Provider API key                          |
//! | `RUNNINGHUB_REGION`     | no       | `hongkong`           | Default region (`hongkong` or `china`)    |
//! | `JOB_APP_ID`            | one of   | --                   | AI application id                         |
//! | `JOB_WORKFLOW_ID`       | one of   | --                   | Workflow id                               |
//! | `JOB_NODE_INFO`         | no       | `[]`                 | JSON array of node/field assignments      |
//! | `JOB_REGION`            | no       | `RUNNINGHUB_REGION`  | Region for this job                       |
//! | `JOB_POLL_TIMEOUT_SECS` | no       | `POLL_TIMEOUT_SECS`  | Polling budget for this job               |
//!
//! Timeouts and poll tuning are documented on
//! [`OrchestratorConfig::from_env`](photofx_runninghub::OrchestratorConfig::from_env).

use photofx_runninghub::{JobEvent, Orchestrator, OrchestratorConfig};
use photofx_worker::job::JobRequest;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photofx_worker=info,photofx_runninghub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = OrchestratorConfig::from_env()?;
    let request = JobRequest::from_env(&config.default_region)?;

    tracing::info!(
        region = %request.region,
        target = request.spec.target.kind(),
        target_id = %request.spec.target.id_str(),
        node_count = request.spec.node_info_list.len(),
        "Starting photofx-worker",
    );

    let orchestrator = Orchestrator::from_config(&config);
    tokio::spawn(log_events(orchestrator.subscribe()));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling job");
            interrupt.cancel();
        }
    });

    match orchestrator
        .poll_until_done(&request.region, &request.spec, request.overrides, &cancel)
        .await
    {
        Ok(urls) => {
            tracing::info!(result_count = urls.len(), "Job completed");
            println!("{}", serde_json::to_string_pretty(&urls)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                code = e.code(),
                retry_later = e.is_worth_retrying_later(),
                error = %e,
                "Job did not complete",
            );
            Err(e.into())
        }
    }
}

/// Log every lifecycle event as structured JSON at debug level.
async fn log_events(mut rx: broadcast::Receiver<JobEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::debug!(task_id = %event.task_id(), event = %json, "Job event"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize job event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Job event log lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
