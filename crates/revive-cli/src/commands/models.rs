use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use revive_core::models::{RestoreModel, UpscaleModel};
use revive_core::provision::ModelStore;

use super::load_config;

#[derive(Args)]
pub struct ModelsArgs {
    /// Download the weights of this restore model if absent
    #[arg(long, value_name = "ID")]
    pub fetch: Option<String>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ModelsArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let store = ModelStore::with_http(config.model_dir.clone());

    if let Some(ref id) = args.fetch {
        let model: RestoreModel = id.parse()?;
        let path = store
            .ensure_model(model)
            .with_context(|| format!("Failed to provision {}", model))?;
        println!("{} ready at {}", model, path.display());
        return Ok(());
    }

    println!("Upscale models:");
    for model in UpscaleModel::ALL {
        let note = if model.is_fixed_x4() { "  (always x4)" } else { "" };
        println!("  {}{}", model, note);
    }

    println!();
    println!("Restore models ({}):", store.dir().display());
    for model in RestoreModel::ALL {
        let status = if store.is_present(model) {
            "present"
        } else {
            "not downloaded"
        };
        println!("  {:<24}{:<10}{}", model.id(), model.arch().tag(), status);
    }

    Ok(())
}
