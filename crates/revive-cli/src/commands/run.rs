use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use revive_core::job::{EnhancementJob, JobRequest};
use revive_core::pipeline::config::EnhanceConfig;
use revive_core::pipeline::{JobEvent, Orchestrator, PipelineResult};
use tracing::debug;

use super::load_config;
use crate::summary::print_job_summary;

#[derive(Args)]
pub struct RunArgs {
    /// Input image (jpg, jpeg, png, bmp or webp)
    pub file: PathBuf,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scale factor (2-4)
    #[arg(long)]
    pub scale: Option<String>,

    /// Output format: jpg, png or webp
    #[arg(long)]
    pub format: Option<String>,

    /// Run the upscale stage. With --restore or --upscale, only the named
    /// stages run and the config's stage defaults are ignored
    #[arg(long, conflicts_with = "no_upscale")]
    pub upscale: bool,

    /// Run face restoration (after upscaling when both are enabled)
    #[arg(long, conflicts_with = "no_restore")]
    pub restore: bool,

    /// Disable the upscale stage
    #[arg(long)]
    pub no_upscale: bool,

    /// Disable face restoration
    #[arg(long)]
    pub no_restore: bool,

    /// Upscale model id
    #[arg(long)]
    pub upscale_model: Option<String>,

    /// Restore model id
    #[arg(long)]
    pub restore_model: Option<String>,

    /// Input faces are already cropped and aligned
    #[arg(long)]
    pub aligned: bool,

    /// Restore only the face closest to the centre
    #[arg(long)]
    pub only_center_face: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let request = build_request(args, &config);
    debug!(?request, "Job request");

    let job = EnhancementJob::from_request(&request)?;
    print_job_summary(&job, &config);

    let orchestrator = Orchestrator::new(config);
    let handle = orchestrator.submit(job)?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}%")?
            .progress_chars("=> "),
    );
    pb.set_message(format!("Job {}", handle.id()));

    let mut result = None;
    while let Some(event) = handle.recv() {
        match event {
            JobEvent::Progress(value) => {
                pb.set_message(orchestrator.state().to_string());
                pb.set_position(u64::from(value));
            }
            JobEvent::Finished(r) => {
                result = Some(r);
                break;
            }
        }
    }

    match result {
        Some(PipelineResult::Completed { output }) => {
            pb.finish_with_message("Done");
            println!("\nOutput saved to {}", output.display());
            Ok(())
        }
        Some(PipelineResult::Failed { reason }) => {
            pb.abandon_with_message("Failed");
            bail!("Job failed ({})", reason)
        }
        None => {
            pb.abandon_with_message("Failed");
            bail!("Worker stopped without reporting a result")
        }
    }
}

fn build_request(args: &RunArgs, config: &EnhanceConfig) -> JobRequest {
    let d = &config.defaults;
    let (upscale, restore) = if args.upscale || args.restore {
        (args.upscale, args.restore)
    } else {
        (d.upscale, d.restore)
    };
    let upscale = upscale && !args.no_upscale;
    let restore = restore && !args.no_restore;

    JobRequest {
        source: args.file.clone(),
        format: args.format.clone().unwrap_or_else(|| d.format.to_string()),
        scale: args.scale.clone().unwrap_or_else(|| d.scale.to_string()),
        upscale,
        restore,
        upscale_model: args
            .upscale_model
            .clone()
            .unwrap_or_else(|| d.upscale_model.to_string()),
        restore_model: args
            .restore_model
            .clone()
            .unwrap_or_else(|| d.restore_model.to_string()),
        aligned: args.aligned || d.aligned,
        only_center_face: args.only_center_face || d.only_center_face,
    }
}
