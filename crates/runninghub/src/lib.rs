//! RunningHub task orchestration client.
//!
//! Submits AI image-processing jobs to the region-partitioned RunningHub
//! OpenAPI, polls them to a terminal state, resolves output URLs, and
//! supports cancellation. Pure domain logic (regions, parameter
//! normalization, status machine, result resolution, error taxonomy)
//! lives in `photofx-core`; this crate adds the HTTP client, the polling
//! loop, lifecycle events, configuration, and the [`Orchestrator`] facade.

pub mod api;
pub mod backoff;
pub mod clock;
pub mod config;
pub mod events;
pub mod orchestrator;
pub mod poller;
pub mod wire;

pub use api::{ClientTimeouts, TaskApi, TaskClient};
pub use backoff::{PollConfig, PollOverrides};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{ConfigError, OrchestratorConfig};
pub use events::JobEvent;
pub use orchestrator::{Orchestrator, SubmittedJob};
pub use poller::PollingOrchestrator;
