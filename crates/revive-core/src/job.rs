use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SCALE, MIN_SCALE, SOURCE_EXTENSIONS};
use crate::error::ValidationError;
use crate::models::{RestoreArch, RestoreModel, UpscaleModel};

/// Output image format shared by both stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpg,
    Png,
    Webp,
}

impl OutputFormat {
    pub const ALL: [Self; 3] = [Self::Jpg, Self::Png, Self::Webp];

    /// File extension, also the value passed to the tool with `-f`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
        }
    }

    /// Whether files written in this format by the upscale tool keep an alpha channel.
    /// The tool writes lossy WebP, so only PNG qualifies.
    pub fn keeps_alpha(&self) -> bool {
        matches!(self, Self::Png)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            _ => Err(ValidationError::UnknownFormat(s.to_string())),
        }
    }
}

/// Scale factor bounded to `[MIN_SCALE, MAX_SCALE]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Scale(u32);

impl Scale {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self(MIN_SCALE)
    }
}

impl TryFrom<u32> for Scale {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (MIN_SCALE..=MAX_SCALE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidScale(value.to_string()))
        }
    }
}

impl From<Scale> for u32 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

impl FromStr for Scale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidScale(s.to_string()))?;
        Scale::try_from(value).map_err(|_| ValidationError::InvalidScale(s.to_string()))
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which stage a job starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageSelection {
    UpscaleOnly,
    RestoreOnly,
}

/// Face-restoration parameters for a job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreParams {
    pub model: RestoreModel,
    pub arch: RestoreArch,
    pub channel_multiplier: u32,
    /// Input faces are already cropped and aligned.
    pub aligned: bool,
    /// Restore only the face closest to the image centre.
    pub only_center_face: bool,
}

impl RestoreParams {
    /// Parameters implied by a model, with alignment flags off.
    pub fn for_model(model: RestoreModel) -> Self {
        Self {
            model,
            arch: model.arch(),
            channel_multiplier: model.channel_multiplier(),
            aligned: false,
            only_center_face: false,
        }
    }
}

impl Default for RestoreParams {
    fn default() -> Self {
        Self::for_model(RestoreModel::default())
    }
}

/// Untyped job parameters as entered by a user.
#[derive(Clone, Debug, Default)]
pub struct JobRequest {
    pub source: PathBuf,
    pub format: String,
    pub scale: String,
    pub upscale: bool,
    pub restore: bool,
    pub upscale_model: String,
    pub restore_model: String,
    pub aligned: bool,
    pub only_center_face: bool,
}

/// One enhancement request. Immutable once submitted.
#[derive(Clone, Debug)]
pub struct EnhancementJob {
    source: PathBuf,
    format: OutputFormat,
    scale: Scale,
    selection: StageSelection,
    chain_restore: bool,
    upscale_model: UpscaleModel,
    restore: RestoreParams,
}

impl EnhancementJob {
    pub fn new(
        source: impl Into<PathBuf>,
        format: OutputFormat,
        scale: Scale,
        selection: StageSelection,
    ) -> Self {
        Self {
            source: source.into(),
            format,
            scale,
            selection,
            chain_restore: false,
            upscale_model: UpscaleModel::default(),
            restore: RestoreParams::default(),
        }
    }

    /// Run the restore stage on the upscale output.
    pub fn with_chain_restore(mut self, chain: bool) -> Self {
        self.chain_restore = chain;
        self
    }

    pub fn with_upscale_model(mut self, model: UpscaleModel) -> Self {
        self.upscale_model = model;
        self
    }

    pub fn with_restore_params(mut self, params: RestoreParams) -> Self {
        self.restore = params;
        self
    }

    /// Parse and check user-entered parameters.
    ///
    /// Enabling both stages chains restoration after upscaling.
    pub fn from_request(request: &JobRequest) -> Result<Self, ValidationError> {
        let format: OutputFormat = request.format.parse()?;
        let scale: Scale = request.scale.parse()?;
        let upscale_model: UpscaleModel = request.upscale_model.parse()?;
        let restore_model: RestoreModel = request.restore_model.parse()?;

        let (selection, chain_restore) = match (request.upscale, request.restore) {
            (true, chain) => (StageSelection::UpscaleOnly, chain),
            (false, true) => (StageSelection::RestoreOnly, false),
            (false, false) => return Err(ValidationError::NoStageSelected),
        };

        let restore = RestoreParams {
            aligned: request.aligned,
            only_center_face: request.only_center_face,
            ..RestoreParams::for_model(restore_model)
        };

        let job = Self {
            source: request.source.clone(),
            format,
            scale,
            selection,
            chain_restore,
            upscale_model,
            restore,
        };
        job.validate()?;
        Ok(job)
    }

    /// Check the parts of the job that depend on the filesystem or on flag combinations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.selection == StageSelection::RestoreOnly && self.chain_restore {
            return Err(ValidationError::UnsupportedChain);
        }
        if !self.source.is_file() {
            return Err(ValidationError::MissingSource(self.source.clone()));
        }
        if !has_source_extension(&self.source) {
            return Err(ValidationError::UnsupportedSourceExtension(
                self.source.clone(),
            ));
        }
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn selection(&self) -> StageSelection {
        self.selection
    }

    pub fn chain_restore(&self) -> bool {
        self.chain_restore
    }

    pub fn upscale_model(&self) -> UpscaleModel {
        self.upscale_model
    }

    pub fn restore_params(&self) -> &RestoreParams {
        &self.restore
    }

    /// Whether the restore stage runs at all, alone or chained.
    pub fn runs_restore(&self) -> bool {
        self.selection == StageSelection::RestoreOnly || self.chain_restore
    }

    /// Scale actually passed to the upscale tool.
    pub fn upscale_scale(&self) -> u32 {
        if self.upscale_model.is_fixed_x4() {
            crate::consts::FIXED_X4_SCALE
        } else {
            self.scale.get()
        }
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
