use std::path::{Path, PathBuf};

use crate::job::{OutputFormat, RestoreParams};
use crate::models::UpscaleModel;

/// The two kinds of enhancement stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    Upscale,
    Restore,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upscale => write!(f, "Upscale"),
            Self::Restore => write!(f, "Restore"),
        }
    }
}

/// Parameters for one run of the external upscale tool.
#[derive(Clone, Debug, PartialEq)]
pub struct UpscaleRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub scale: u32,
    pub model: UpscaleModel,
    pub format: OutputFormat,
}

/// Parameters for one in-process face restoration.
#[derive(Clone, Debug, PartialEq)]
pub struct RestoreRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub upscale: u32,
    pub format: OutputFormat,
    /// Local path of the model weights.
    pub weights: PathBuf,
    pub params: RestoreParams,
}

/// Stage-specific execution parameters, owned by the runner while it runs.
#[derive(Clone, Debug, PartialEq)]
pub enum StageRequest {
    Upscale(UpscaleRequest),
    Restore(RestoreRequest),
}

impl StageRequest {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Upscale(_) => StageKind::Upscale,
            Self::Restore(_) => StageKind::Restore,
        }
    }

    pub fn input(&self) -> &Path {
        match self {
            Self::Upscale(r) => &r.input,
            Self::Restore(r) => &r.input,
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            Self::Upscale(r) => &r.output,
            Self::Restore(r) => &r.output,
        }
    }

    /// Replace the input, used to feed one stage's output into the next.
    pub fn with_input(mut self, input: &Path) -> Self {
        match &mut self {
            Self::Upscale(r) => r.input = input.to_path_buf(),
            Self::Restore(r) => r.input = input.to_path_buf(),
        }
        self
    }
}
