//! Job description loaded from the environment.

use std::time::Duration;

use anyhow::{bail, Context};
use photofx_core::params::RawAssignment;
use photofx_core::submission::JobSpec;
use photofx_runninghub::PollOverrides;

/// One job to run, plus where and how long to poll it.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub region: String,
    pub spec: JobSpec,
    pub overrides: PollOverrides,
}

impl JobRequest {
    /// Load the job from environment variables.
    ///
    /// Exactly one of `JOB_APP_ID` / `JOB_WORKFLOW_ID` must be set.
    /// `JOB_NODE_INFO` is a JSON array of `{nodeId, fieldName, fieldValue}`
    /// objects. `JOB_REGION` falls back to `default_region`.
    pub fn from_env(default_region: &str) -> anyhow::Result<Self> {
        Self::from_lookup(default_region, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(default_region: &str, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let node_info_list: Vec<RawAssignment> = match non_blank("JOB_NODE_INFO") {
            Some(raw) => serde_json::from_str(&raw).context(
                "JOB_NODE_INFO must be a JSON array of {nodeId, fieldName, fieldValue} objects",
            )?,
            None => Vec::new(),
        };

        let spec = match (non_blank("JOB_APP_ID"), non_blank("JOB_WORKFLOW_ID")) {
            (Some(app_id), None) => JobSpec::ai_app(app_id, node_info_list),
            (None, Some(workflow_id)) => JobSpec::workflow(workflow_id, node_info_list),
            (Some(_), Some(_)) => bail!("Set only one of JOB_APP_ID and JOB_WORKFLOW_ID"),
            (None, None) => bail!("JOB_APP_ID or JOB_WORKFLOW_ID environment variable is required"),
        };

        let region = non_blank("JOB_REGION").unwrap_or_else(|| default_region.to_string());

        let timeout = non_blank("JOB_POLL_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("JOB_POLL_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })
            .transpose()?;

        Ok(Self {
            region,
            spec,
            overrides: PollOverrides {
                timeout,
                ..PollOverrides::default()
            },
        })
    }
}
