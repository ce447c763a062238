pub mod config;
pub mod info;
pub mod models;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use revive_core::pipeline::config::EnhanceConfig;

/// Config from `path`, or the built-in defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EnhanceConfig> {
    match path {
        Some(path) => EnhanceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EnhanceConfig::default()),
    }
}
