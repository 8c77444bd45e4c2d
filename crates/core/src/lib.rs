//! Pure domain logic for the RunningHub task orchestration client.
//!
//! Everything in this crate is free of network I/O so it can be shared by
//! the HTTP client, the polling loop, and any caller that needs the same
//! vocabulary:
//!
//! - [`region`] -- region id to base URL / `Host` header routing.
//! - [`params`] -- node/field parameter normalization to wire strings.
//! - [`ids`] -- string-only identifier newtypes.
//! - [`submission`] -- normalized job submissions.
//! - [`status`] -- the task status state machine.
//! - [`result`] -- result payload to absolute URL resolution.
//! - [`error`] / [`classify`] -- the shared error taxonomy.
//! - [`job`] -- the ephemeral per-job record.

pub mod classify;
pub mod error;
pub mod ids;
pub mod job;
pub mod params;
pub mod region;
pub mod result;
pub mod status;
pub mod submission;
pub mod types;

pub use error::TaskError;
pub use ids::{AppId, TaskId, WorkflowId};
pub use region::{RegionConfig, RegionRouter};
pub use status::TaskStatus;
