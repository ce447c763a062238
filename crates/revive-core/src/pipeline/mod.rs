pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{plan_stages, Orchestrator};
pub use types::{FailureReason, JobEvent, JobHandle, JobId, JobPhase, PipelineResult, SchedulerState};
