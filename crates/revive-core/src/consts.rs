/// Smallest scale factor accepted for a job.
pub const MIN_SCALE: u32 = 2;

/// Largest scale factor accepted for a job.
pub const MAX_SCALE: u32 = 4;

/// Scale forced by upscale models trained for a fixed 4x factor.
pub const FIXED_X4_SCALE: u32 = 4;

/// Progress value that marks a finished stage or job.
pub const PROGRESS_DONE: u8 = 100;

/// Restore stage checkpoint after the input image is decoded.
pub const RESTORE_PROGRESS_DECODED: u8 = 25;

/// Restore stage checkpoint after inference returns.
pub const RESTORE_PROGRESS_INFERRED: u8 = 75;

/// Number of trailing non-progress tool lines kept as a failure reason.
pub const DIAGNOSTIC_TAIL_LINES: usize = 64;

/// Source file extensions accepted for a job (lowercase).
pub const SOURCE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Prefix of job-scoped temporary directories.
pub const STAGING_DIR_PREFIX: &str = "revive-stage-";

/// chrono format for output and staging file timestamps (microsecond resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Suffix of partially downloaded model weights.
pub const DOWNLOAD_SUFFIX: &str = "part";

/// Name of the dedicated job worker thread.
pub const WORKER_THREAD_NAME: &str = "revive-worker";

/// Leading bytes of a zip-format PyTorch checkpoint.
pub const WEIGHTS_ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Protocol opcode that starts a legacy pickled checkpoint.
pub const WEIGHTS_PICKLE_MAGIC: &[u8] = &[0x80];
