//! Job submissions.
//!
//! A [`JobSpec`] is what callers build; a [`JobSubmission`] is what the
//! task client sends. The only path from one to the other is
//! [`JobSubmission::from_spec`], which always runs parameter normalization.

use serde::Deserialize;

use crate::error::TaskError;
use crate::ids::{AppId, WorkflowId};
use crate::params::{normalize, NodeFieldAssignment, RawAssignment};

/// What to run on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobTarget {
    /// A published AI application (`webappId`).
    AiApp(AppId),
    /// A raw workflow (`workflowId`).
    Workflow(WorkflowId),
}

impl JobTarget {
    /// The identifier text, for logging.
    pub fn id_str(&self) -> &str {
        match self {
            JobTarget::AiApp(id) => id.as_str(),
            JobTarget::Workflow(id) => id.as_str(),
        }
    }

    /// Short label for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            JobTarget::AiApp(_) => "ai_app",
            JobTarget::Workflow(_) => "workflow",
        }
    }
}

/// Caller-facing job description, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub target: JobTarget,
    #[serde(default)]
    pub node_info_list: Vec<RawAssignment>,
}

impl JobSpec {
    pub fn ai_app(id: impl Into<AppId>, node_info_list: Vec<RawAssignment>) -> Self {
        Self {
            target: JobTarget::AiApp(id.into()),
            node_info_list,
        }
    }

    pub fn workflow(id: impl Into<WorkflowId>, node_info_list: Vec<RawAssignment>) -> Self {
        Self {
            target: JobTarget::Workflow(id.into()),
            node_info_list,
        }
    }
}

/// A normalized submission bound to a region.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSubmission {
    target: JobTarget,
    node_info_list: Vec<NodeFieldAssignment>,
    region_id: String,
}

impl JobSubmission {
    /// Normalize a spec for submission to `region_id`.
    ///
    /// Fails with [`TaskError::InvalidParameter`] when the target id is blank
    /// or any assignment fails normalization.
    pub fn from_spec(region_id: impl Into<String>, spec: &JobSpec) -> Result<Self, TaskError> {
        if spec.target.id_str().trim().is_empty() {
            return Err(TaskError::InvalidParameter(format!(
                "{} id must not be empty",
                spec.target.kind()
            )));
        }
        Ok(Self {
            target: spec.target.clone(),
            node_info_list: normalize(&spec.node_info_list)?,
            region_id: region_id.into(),
        })
    }

    pub fn target(&self) -> &JobTarget {
        &self.target
    }

    pub fn node_info_list(&self) -> &[NodeFieldAssignment] {
        &self.node_info_list
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }
}
