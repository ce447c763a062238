use std::path::PathBuf;

use thiserror::Error;

/// Rejected job parameters. Raised before any stage is dispatched.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Input file does not exist: {0}")]
    MissingSource(PathBuf),

    #[error("Unsupported input file type: {0}")]
    UnsupportedSourceExtension(PathBuf),

    #[error("Invalid scale {0:?}: must be a whole number between 2 and 4")]
    InvalidScale(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Unknown upscale model: {0}")]
    UnknownUpscaleModel(String),

    #[error("Unknown restore model: {0}")]
    UnknownRestoreModel(String),

    #[error("No enhancement stage selected")]
    NoStageSelected,

    #[error("Upscaling after restoration is not supported")]
    UnsupportedChain,
}

/// Failure to make model weights available locally.
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Model cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Download of {url} returned no data")]
    EmptyDownload { url: String },
}

/// Error returned by a face-restoration backend.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model weights not found: {0}")]
    MissingWeights(PathBuf),

    #[error("Model weights file is empty: {0}")]
    EmptyWeights(PathBuf),

    #[error("Not a PyTorch checkpoint: {0}")]
    InvalidWeights(PathBuf),

    #[error("Invalid upscale factor: {0}")]
    InvalidUpscale(u32),

    #[error("Failed to read model weights: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

/// Stable reason tags carried by every failed job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ToolNotFound,
    ToolAbnormalExit,
    OutputMissing,
    DecodeFailure,
    EncodeFailure,
    InferenceFailure,
    StagingFailure,
    Cancelled,
    WorkerLost,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToolNotFound => write!(f, "tool-not-found"),
            Self::ToolAbnormalExit => write!(f, "tool-abnormal-exit"),
            Self::OutputMissing => write!(f, "output-missing"),
            Self::DecodeFailure => write!(f, "decode-failure"),
            Self::EncodeFailure => write!(f, "encode-failure"),
            Self::InferenceFailure => write!(f, "inference-failure"),
            Self::StagingFailure => write!(f, "staging-failure"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::WorkerLost => write!(f, "worker-lost"),
        }
    }
}

/// Failure of a running stage. Always converted into the job's terminal event.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Upscale tool not found: {0}")]
    ToolNotFound(PathBuf),

    #[error("Failed to launch upscale tool {tool}: {source}")]
    ToolLaunch {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upscale tool exited abnormally ({status}): {output}")]
    ToolAbnormalExit { status: String, output: String },

    #[error("Stage reported success but produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Face restoration failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Failed to stage input: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Job cancelled")]
    Cancelled,
}

impl StageError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ToolNotFound(_) => FailureKind::ToolNotFound,
            Self::ToolLaunch { .. } | Self::ToolAbnormalExit { .. } => {
                FailureKind::ToolAbnormalExit
            }
            Self::OutputMissing(_) => FailureKind::OutputMissing,
            Self::Decode { .. } => FailureKind::DecodeFailure,
            Self::Encode { .. } => FailureKind::EncodeFailure,
            Self::Inference(_) => FailureKind::InferenceFailure,
            Self::Staging(_) => FailureKind::StagingFailure,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Reasons a job submission is refused.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error("A job is already running")]
    Busy,

    #[error("Failed to create output directory: {0}")]
    OutputDir(std::io::Error),

    #[error("Failed to start worker thread: {0}")]
    Spawn(std::io::Error),
}

/// Config file load/save errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
