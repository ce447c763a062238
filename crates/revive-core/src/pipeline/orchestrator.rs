use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::consts::WORKER_THREAD_NAME;
use crate::error::{StageError, SubmitError};
use crate::inference::{BackgroundRestorer, FaceRestorer};
use crate::io::naming::{restore_output_path, timestamp, upscale_output_path};
use crate::job::{EnhancementJob, StageSelection};
use crate::progress::{JobProgress, ProgressBand};
use crate::provision::ModelStore;
use crate::stage::{RestoreRequest, RestoreRunner, StageRequest, UpscaleRequest, UpscaleRunner};
use crate::staging::{self, ArtifactStager};

use super::config::EnhanceConfig;
use super::types::{
    FailureReason, JobEvent, JobHandle, JobId, JobPhase, PipelineResult, SchedulerState,
};

/// Build the ordered stage requests for a job.
///
/// Restore is always second when chained, and reads the upscale output.
/// Every request starts from the job's source; the worker swaps in a staged
/// input for the first stage when staging happens.
pub fn plan_stages(
    job: &EnhancementJob,
    output_dir: &Path,
    weights: Option<&Path>,
    stamp: &str,
) -> Vec<StageRequest> {
    let mut plan = Vec::with_capacity(2);
    let mut input = job.source().to_path_buf();

    if job.selection() == StageSelection::UpscaleOnly {
        let scale = job.upscale_scale();
        let output = upscale_output_path(output_dir, scale, stamp, job.format());
        plan.push(StageRequest::Upscale(UpscaleRequest {
            input: input.clone(),
            output: output.clone(),
            scale,
            model: job.upscale_model(),
            format: job.format(),
        }));
        input = output;
    }

    if job.runs_restore() {
        let params = job.restore_params().clone();
        let weights = weights
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(params.model.file_name()));
        plan.push(StageRequest::Restore(RestoreRequest {
            input,
            output: restore_output_path(output_dir, stamp, job.format()),
            upscale: job.scale().get(),
            format: job.format(),
            weights,
            params,
        }));
    }

    plan
}

/// Accepts jobs and runs them on a dedicated worker thread, one at a time.
pub struct Orchestrator {
    config: EnhanceConfig,
    upscaler: UpscaleRunner,
    restorer: RestoreRunner,
    stager: ArtifactStager,
    models: ModelStore,
    state: Arc<Mutex<SchedulerState>>,
    next_id: AtomicU64,
}

impl Orchestrator {
    /// Orchestrator with the built-in restoration backend and HTTP model downloads.
    pub fn new(config: EnhanceConfig) -> Self {
        let models = ModelStore::with_http(config.model_dir.clone());
        Self::with_backends(config, Arc::new(BackgroundRestorer), models)
    }

    pub fn with_backends(
        config: EnhanceConfig,
        restorer: Arc<dyn FaceRestorer>,
        models: ModelStore,
    ) -> Self {
        Self {
            upscaler: UpscaleRunner::new(config.tool.clone()),
            restorer: RestoreRunner::new(restorer),
            stager: ArtifactStager::new(config.work_dir.clone()),
            models,
            config,
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub fn state(&self) -> SchedulerState {
        *lock(&self.state)
    }

    /// Validate, provision and start a job.
    ///
    /// Validation errors are returned before anything else happens. The
    /// scheduler slot is then reserved in one step with the busy check, so a
    /// second submission while a job is provisioning or running is refused
    /// at once with [`SubmitError::Busy`] and leaves the active job untouched.
    /// Any later submission error returns the slot to `Idle`.
    pub fn submit(&self, job: EnhancementJob) -> Result<JobHandle, SubmitError> {
        job.validate()?;
        let id = self.reserve()?;

        let plan = match self.prepare(&job) {
            Ok(plan) => plan,
            Err(e) => {
                self.release(id);
                return Err(e);
            }
        };

        info!(
            job = %id,
            source = %job.source().display(),
            format = %job.format(),
            scale = %job.scale(),
            stages = plan.len(),
            "Job submitted"
        );

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let worker = JobWorker {
            id,
            job,
            plan,
            upscaler: self.upscaler.clone(),
            restorer: self.restorer.clone(),
            stager: self.stager.clone(),
            state: Arc::clone(&self.state),
            tx,
            cancel: cancel.clone(),
        };

        let spawned = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || worker.run());
        if let Err(e) = spawned {
            self.release(id);
            return Err(SubmitError::Spawn(e));
        }

        Ok(JobHandle {
            id,
            events: rx,
            cancel,
        })
    }

    fn reserve(&self) -> Result<JobId, SubmitError> {
        let mut state = lock(&self.state);
        if !state.is_idle() {
            return Err(SubmitError::Busy);
        }
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        *state = SchedulerState::Active {
            job: id,
            phase: JobPhase::Provisioning,
        };
        Ok(id)
    }

    fn release(&self, id: JobId) {
        let mut state = lock(&self.state);
        if matches!(*state, SchedulerState::Active { job, .. } if job == id) {
            *state = SchedulerState::Idle;
        }
    }

    /// Fetch weights, create the output directory and plan the stages.
    fn prepare(&self, job: &EnhancementJob) -> Result<Vec<StageRequest>, SubmitError> {
        if job.selection() == StageSelection::UpscaleOnly && job.upscale_scale() != job.scale().get() {
            info!(
                model = %job.upscale_model(),
                requested = %job.scale(),
                scale = job.upscale_scale(),
                "Model upscales at a fixed factor"
            );
        }

        let weights = if job.runs_restore() {
            Some(self.models.ensure_model(job.restore_params().model)?)
        } else {
            None
        };
        std::fs::create_dir_all(&self.config.output_dir).map_err(SubmitError::OutputDir)?;

        Ok(plan_stages(job, &self.config.output_dir, weights.as_deref(), &timestamp()))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

fn lock(state: &Mutex<SchedulerState>) -> MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the worker thread owns for the lifetime of one job.
struct JobWorker {
    id: JobId,
    job: EnhancementJob,
    plan: Vec<StageRequest>,
    upscaler: UpscaleRunner,
    restorer: RestoreRunner,
    stager: ArtifactStager,
    state: Arc<Mutex<SchedulerState>>,
    tx: mpsc::Sender<JobEvent>,
    cancel: CancelToken,
}

impl JobWorker {
    fn run(self) {
        let mut progress = JobProgress::new();

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| self.execute(&mut progress)));
        let result = match outcome {
            Ok(Ok(output)) => {
                info!(job = %self.id, output = %output.display(), "Job completed");
                PipelineResult::Completed { output }
            }
            Ok(Err(err)) => {
                let reason = FailureReason::from(&err);
                warn!(job = %self.id, reason = %reason, "Job failed");
                PipelineResult::Failed { reason }
            }
            Err(_) => {
                warn!(job = %self.id, "Job worker panicked");
                PipelineResult::Failed {
                    reason: FailureReason::worker_lost(),
                }
            }
        };

        if let Some(done) = progress.finish() {
            let _ = self.tx.send(JobEvent::Progress(done));
        }
        *lock(&self.state) = SchedulerState::Idle;
        let _ = self.tx.send(JobEvent::Finished(result));
    }

    /// Staging, then each planned stage in order. The staged input is
    /// released before returning on every path.
    fn execute(&self, progress: &mut JobProgress) -> Result<PathBuf, StageError> {
        self.set_phase(JobPhase::Staging);
        let staged = self.stager.stage(self.job.source(), self.job.format())?;
        if staged.is_staged() {
            debug!(job = %self.id, staged = %staged.path().display(), "Using staged input");
        }

        let outcome = self.run_stages(staged.path(), progress);
        staging::release(staged);
        outcome
    }

    fn run_stages(&self, first_input: &Path, progress: &mut JobProgress) -> Result<PathBuf, StageError> {
        let count = self.plan.len();
        let mut input = first_input.to_path_buf();

        for (index, planned) in self.plan.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(StageError::Cancelled);
            }
            let phase = if index == 0 {
                JobPhase::Stage1Running
            } else {
                JobPhase::Stage2Running
            };
            self.set_phase(phase);

            let request = planned.clone().with_input(&input);
            let band = ProgressBand::for_stage(index, count);
            info!(
                job = %self.id,
                stage = %request.kind(),
                input = %request.input().display(),
                output = %request.output().display(),
                "Dispatching stage"
            );

            let tx = &self.tx;
            let mut report = |value: u8| {
                if let Some(p) = progress.advance(band.map(value)) {
                    let _ = tx.send(JobEvent::Progress(p));
                }
            };

            input = match &request {
                StageRequest::Upscale(r) => self.upscaler.run(r, &self.cancel, &mut report)?,
                StageRequest::Restore(r) => self.restorer.run(r, &self.cancel, &mut report)?,
            };
        }

        Ok(input)
    }

    fn set_phase(&self, phase: JobPhase) {
        let mut state = lock(&self.state);
        if let SchedulerState::Active { job, .. } = *state {
            if job == self.id {
                *state = SchedulerState::Active { job, phase };
            }
        }
    }
}
