use std::path::PathBuf;
use std::sync::mpsc;

use crate::cancel::CancelToken;
use crate::error::{FailureKind, StageError};

/// Identifier of a submitted job, unique per orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl JobId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an active job currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobPhase {
    /// Slot reserved while model weights are made available.
    Provisioning,
    Staging,
    Stage1Running,
    Stage2Running,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provisioning => write!(f, "Fetching models"),
            Self::Staging => write!(f, "Staging input"),
            Self::Stage1Running => write!(f, "Running stage 1"),
            Self::Stage2Running => write!(f, "Running stage 2"),
        }
    }
}

/// Process-wide scheduler state. At most one job is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active { job: JobId, phase: JobPhase },
}

impl SchedulerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active { phase, .. } => write!(f, "{phase}"),
        }
    }
}

/// Human-readable failure with a stable reason tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub(crate) fn worker_lost() -> Self {
        Self {
            kind: FailureKind::WorkerLost,
            message: "Worker stopped without reporting a result".into(),
        }
    }
}

impl From<&StageError> for FailureReason {
    fn from(err: &StageError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Terminal outcome of a job. Exactly one per submitted job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineResult {
    Completed { output: PathBuf },
    Failed { reason: FailureReason },
}

impl PipelineResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Self::Completed { output } => Some(output),
            Self::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { reason } => Some(reason),
        }
    }
}

/// Events delivered for one job, in order. `Finished` is always last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobEvent {
    Progress(u8),
    Finished(PipelineResult),
}

/// Caller's side of a submitted job.
pub struct JobHandle {
    pub(crate) id: JobId,
    pub(crate) events: mpsc::Receiver<JobEvent>,
    pub(crate) cancel: CancelToken,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Ask the worker to stop. The job still ends with a terminal event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the next event. `None` once the terminal event has been taken.
    pub fn recv(&self) -> Option<JobEvent> {
        self.events.recv().ok()
    }

    /// Block until the job ends, passing each progress value to `on_progress`.
    pub fn wait(self, mut on_progress: impl FnMut(u8)) -> PipelineResult {
        while let Ok(event) = self.events.recv() {
            match event {
                JobEvent::Progress(value) => on_progress(value),
                JobEvent::Finished(result) => return result,
            }
        }
        PipelineResult::Failed {
            reason: FailureReason::worker_lost(),
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("id", &self.id).finish()
    }
}
