//! In-process face restoration backends.

use std::io::Read;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::consts::{WEIGHTS_PICKLE_MAGIC, WEIGHTS_ZIP_MAGIC};
use crate::error::InferenceError;
use crate::job::RestoreParams;
use crate::models::RestoreArch;

/// Options for one restoration call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreOptions {
    pub weights: PathBuf,
    pub upscale: u32,
    pub arch: RestoreArch,
    pub channel_multiplier: u32,
    pub aligned: bool,
    pub only_center_face: bool,
    /// Composite restored faces back into the full frame. Always enabled.
    pub paste_back: bool,
}

impl RestoreOptions {
    pub fn new(weights: PathBuf, upscale: u32, params: &RestoreParams) -> Self {
        Self {
            weights,
            upscale,
            arch: params.arch,
            channel_multiplier: params.channel_multiplier,
            aligned: params.aligned,
            only_center_face: params.only_center_face,
            paste_back: true,
        }
    }
}

/// A face-restoration model that runs inside the process.
///
/// Implementations receive a decoded image and return the full restored frame.
pub trait FaceRestorer: Send + Sync {
    fn name(&self) -> &str;

    fn restore(
        &self,
        image: &DynamicImage,
        options: &RestoreOptions,
    ) -> Result<DynamicImage, InferenceError>;
}

/// Restoration backend used when no neural runtime is linked in.
///
/// Reads and checks the weights header, then runs the background path of restoration: the
/// whole frame is resampled by the upscale factor with Lanczos filtering and
/// no face regions are replaced before paste-back.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackgroundRestorer;

impl FaceRestorer for BackgroundRestorer {
    fn name(&self) -> &str {
        "background"
    }

    fn restore(
        &self,
        image: &DynamicImage,
        options: &RestoreOptions,
    ) -> Result<DynamicImage, InferenceError> {
        check_weights(&options.weights)?;
        if options.upscale == 0 {
            return Err(InferenceError::InvalidUpscale(options.upscale));
        }

        debug!(
            arch = %options.arch,
            channel_multiplier = options.channel_multiplier,
            aligned = options.aligned,
            only_center_face = options.only_center_face,
            upscale = options.upscale,
            "Running background restoration"
        );

        if options.upscale == 1 {
            return Ok(image.clone());
        }
        let width = image.width().saturating_mul(options.upscale);
        let height = image.height().saturating_mul(options.upscale);
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }
}

/// Open a checkpoint and check it starts like a PyTorch archive (zip) or a
/// legacy pickle stream.
pub fn check_weights(path: &Path) -> Result<(), InferenceError> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            InferenceError::MissingWeights(path.to_path_buf())
        } else {
            InferenceError::Io(e)
        }
    })?;

    let mut header = Vec::with_capacity(WEIGHTS_ZIP_MAGIC.len());
    file.take(WEIGHTS_ZIP_MAGIC.len() as u64)
        .read_to_end(&mut header)?;

    if header.is_empty() {
        return Err(InferenceError::EmptyWeights(path.to_path_buf()));
    }
    if header.starts_with(WEIGHTS_PICKLE_MAGIC) || header.as_slice() == WEIGHTS_ZIP_MAGIC {
        Ok(())
    } else {
        Err(InferenceError::InvalidWeights(path.to_path_buf()))
    }
}
