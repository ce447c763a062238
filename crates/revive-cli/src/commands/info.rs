use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use revive_core::io::image_io::probe_image;
use revive_core::job::OutputFormat;
use revive_core::staging::staging_required;

#[derive(Args)]
pub struct InfoArgs {
    /// Input image
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let info = probe_image(&args.file)?;

    println!("File:        {}", args.file.display());
    match info.format {
        Some(format) => println!("Format:      {:?}", format),
        None => println!("Format:      unknown"),
    }
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Color:       {:?}", info.color);
    println!("Alpha:       {}", if info.has_alpha() { "yes" } else { "no" });

    for target in OutputFormat::ALL {
        let staged = staging_required(info.format, target);
        println!(
            "To {:<9}{}",
            format!("{}:", target),
            if staged { "staged to RGB JPEG" } else { "used as-is" }
        );
    }

    Ok(())
}
