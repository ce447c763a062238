use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::consts::{PROGRESS_DONE, RESTORE_PROGRESS_DECODED, RESTORE_PROGRESS_INFERRED};
use crate::error::{InferenceError, StageError};
use crate::inference::{FaceRestorer, RestoreOptions};
use crate::io::image_io::{load_image, save_image};

use super::request::RestoreRequest;

/// Runs face restoration in-process with coarse progress checkpoints.
#[derive(Clone)]
pub struct RestoreRunner {
    restorer: Arc<dyn FaceRestorer>,
}

impl RestoreRunner {
    pub fn new(restorer: Arc<dyn FaceRestorer>) -> Self {
        Self { restorer }
    }

    /// Decode (25), restore (75), encode (100).
    pub fn run(
        &self,
        request: &RestoreRequest,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<PathBuf, StageError> {
        let img = load_image(&request.input).map_err(|e| StageError::Decode {
            path: request.input.clone(),
            source: e,
        })?;
        on_progress(RESTORE_PROGRESS_DECODED);

        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }
        let options = RestoreOptions::new(request.weights.clone(), request.upscale, &request.params);
        debug!(backend = self.restorer.name(), input = %request.input.display(), "Restoring faces");
        let restored = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.restorer.restore(&img, &options)
        }))
        .map_err(|_| {
            InferenceError::Backend(format!("{} backend panicked", self.restorer.name()))
        })??;
        on_progress(RESTORE_PROGRESS_INFERRED);

        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }
        save_image(&restored, &request.output, request.format).map_err(|e| StageError::Encode {
            path: request.output.clone(),
            source: e,
        })?;
        on_progress(PROGRESS_DONE);
        Ok(request.output.clone())
    }
}

impl std::fmt::Debug for RestoreRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreRunner")
            .field("restorer", &self.restorer.name())
            .finish()
    }
}
