use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::job::{OutputFormat, Scale};
use crate::models::{RestoreModel, UpscaleModel};
use crate::stage::default_tool_path;

/// Orchestrator configuration, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Upscale executable.
    pub tool: PathBuf,
    /// Shared output directory, created on demand.
    pub output_dir: PathBuf,
    /// Cache directory for restoration weights.
    pub model_dir: PathBuf,
    /// Parent of job-scoped temp directories. System temp dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    pub defaults: JobDefaults,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            tool: default_tool_path(),
            output_dir: PathBuf::from("output"),
            model_dir: PathBuf::from("."),
            work_dir: None,
            defaults: JobDefaults::default(),
        }
    }
}

impl EnhanceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Job parameters used when the user does not override them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefaults {
    pub format: OutputFormat,
    pub scale: Scale,
    pub upscale_model: UpscaleModel,
    pub restore_model: RestoreModel,
    pub upscale: bool,
    pub restore: bool,
    pub aligned: bool,
    pub only_center_face: bool,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpg,
            scale: Scale::default(),
            upscale_model: UpscaleModel::X4Plus,
            restore_model: RestoreModel::CleanV1NoCeC2,
            upscale: false,
            restore: true,
            aligned: false,
            only_center_face: false,
        }
    }
}
