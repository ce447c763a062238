use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::consts::STAGING_DIR_PREFIX;
use crate::error::StageError;
use crate::io::image_io::{guess_format, load_image, save_image};
use crate::io::naming::{staged_input_path, timestamp};
use crate::job::OutputFormat;

/// Source containers that may carry an alpha channel.
pub fn is_alpha_capable(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff | ImageFormat::Gif | ImageFormat::Bmp
    )
}

/// Staging is needed exactly when an alpha-capable source is sent to a format that drops alpha.
pub fn staging_required(source_format: Option<ImageFormat>, target: OutputFormat) -> bool {
    source_format.is_some_and(is_alpha_capable) && !target.keeps_alpha()
}

/// The effective input of a job's first stage.
///
/// Owns the job-scoped temp directory when staging happened. The directory is
/// removed by [`StagedInput::cleanup`], or on drop if cleanup never ran.
#[derive(Debug)]
pub struct StagedInput {
    path: PathBuf,
    temp_dir: Option<TempDir>,
}

impl StagedInput {
    /// Use the original source unchanged.
    pub fn original(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            temp_dir: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_staged(&self) -> bool {
        self.temp_dir.is_some()
    }

    /// Job-scoped temp directory, if one was created.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Remove the temp directory and everything under it.
    pub fn cleanup(mut self) -> std::io::Result<()> {
        match self.temp_dir.take() {
            Some(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()?;
                debug!(dir = %path.display(), "Removed staging directory");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Prepares substitute inputs for sources whose colour mode the requested
/// output format cannot carry.
#[derive(Clone, Debug, Default)]
pub struct ArtifactStager {
    work_dir: Option<PathBuf>,
}

impl ArtifactStager {
    /// Temp directories are created under `work_dir`, or the system temp dir when `None`.
    pub fn new(work_dir: Option<PathBuf>) -> Self {
        Self { work_dir }
    }

    /// Decide on staging and, when required, write an RGB JPEG into a fresh
    /// job-scoped temp directory.
    pub fn stage(&self, source: &Path, target: OutputFormat) -> Result<StagedInput, StageError> {
        let source_format = guess_format(source);
        if !staging_required(source_format, target) {
            debug!(source = %source.display(), ?source_format, %target, "No staging needed");
            return Ok(StagedInput::original(source));
        }

        let temp_dir = self.create_temp_dir()?;
        let staged_path = staged_input_path(temp_dir.path(), &timestamp());

        let img = load_image(source).map_err(|e| StageError::Decode {
            path: source.to_path_buf(),
            source: e,
        })?;
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        save_image(&rgb, &staged_path, OutputFormat::Jpg).map_err(|e| StageError::Encode {
            path: staged_path.clone(),
            source: e,
        })?;

        debug!(
            source = %source.display(),
            staged = %staged_path.display(),
            had_alpha = img.color().has_alpha(),
            "Staged RGB input"
        );

        Ok(StagedInput {
            path: staged_path,
            temp_dir: Some(temp_dir),
        })
    }

    fn create_temp_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_DIR_PREFIX);
        match &self.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
    }
}

/// Remove a job's staged artifacts, logging rather than failing the job.
pub(crate) fn release(staged: StagedInput) {
    let dir = staged.temp_dir().map(Path::to_path_buf);
    if let Err(e) = staged.cleanup() {
        if let Some(dir) = dir {
            warn!(dir = %dir.display(), error = %e, "Failed to remove staging directory");
        }
    }
}
