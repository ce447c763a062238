#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use revive_core::error::{InferenceError, ProvisioningError};
use revive_core::inference::{BackgroundRestorer, FaceRestorer, RestoreOptions};
use revive_core::models::RestoreModel;
use revive_core::provision::{ModelFetcher, ModelStore};

/// Write a semi-transparent RGBA gradient PNG.
pub fn write_rgba_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 16) as u8, (y * 16) as u8, 128, 100])
    });
    img.save_with_format(path, ImageFormat::Png).expect("write png");
}

/// Write an opaque RGB JPEG.
pub fn write_rgb_jpg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 64]));
    DynamicImage::ImageRgb8(img)
        .save_with_format(path, ImageFormat::Jpeg)
        .expect("write jpg");
}

/// Write placeholder weights with a zip checkpoint header for `model` into `dir`.
pub fn seed_weights(dir: &Path, model: RestoreModel) -> PathBuf {
    let path = dir.join(model.file_name());
    std::fs::write(&path, b"PK\x03\x04weights").expect("write weights");
    path
}

/// Fetcher that always fails and counts attempts.
#[derive(Default)]
pub struct OfflineFetcher {
    pub calls: Arc<AtomicUsize>,
}

impl ModelFetcher for OfflineFetcher {
    fn fetch(&self, _url: &str, _dest: &Path) -> Result<u64, ProvisioningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProvisioningError::Io(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            "offline",
        )))
    }
}

/// Model store over `dir` that never touches the network.
pub fn offline_store(dir: &Path) -> ModelStore {
    ModelStore::new(dir, Box::new(OfflineFetcher::default()))
}

/// Background restorer that counts how often it is called.
#[derive(Default)]
pub struct CountingRestorer {
    pub calls: AtomicUsize,
}

impl FaceRestorer for CountingRestorer {
    fn name(&self) -> &str {
        "counting"
    }

    fn restore(
        &self,
        image: &DynamicImage,
        options: &RestoreOptions,
    ) -> Result<DynamicImage, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        BackgroundRestorer.restore(image, options)
    }
}

/// Restorer whose inference always fails.
pub struct FailingRestorer;

impl FaceRestorer for FailingRestorer {
    fn name(&self) -> &str {
        "failing"
    }

    fn restore(
        &self,
        _image: &DynamicImage,
        _options: &RestoreOptions,
    ) -> Result<DynamicImage, InferenceError> {
        Err(InferenceError::Backend("model exploded".into()))
    }
}

/// A shell script standing in for the upscale executable.
///
/// It records its parsed arguments to `args.log` next to itself, prints the
/// configured lines (to stderr unless `stderr` is false), optionally waits for
/// a gate file, copies `-i` to `-o` and exits with the configured code.
#[cfg(unix)]
pub struct FakeTool {
    pub lines: Vec<String>,
    pub stderr: bool,
    pub exit_code: i32,
    pub write_output: bool,
    pub gate: Option<PathBuf>,
}

#[cfg(unix)]
impl Default for FakeTool {
    fn default() -> Self {
        Self {
            lines: vec![
                "realesrgan-ncnn-vulkan: loading model".into(),
                "0,00%".into(),
                "25,00%".into(),
                "50.00%".into(),
                "40,00%".into(),
                "75,50%".into(),
            ],
            stderr: true,
            exit_code: 0,
            write_output: true,
            gate: None,
        }
    }
}

#[cfg(unix)]
impl FakeTool {
    /// Install the script into `dir` and return its path.
    pub fn install(&self, dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("args.log");
        let mut script = String::from("#!/bin/sh\n");
        script.push_str(
            "while [ $# -gt 0 ]; do\n  case \"$1\" in\n    -i) IN=\"$2\"; shift 2;;\n    -o) OUT=\"$2\"; shift 2;;\n    -s) SCALE=\"$2\"; shift 2;;\n    -n) MODEL=\"$2\"; shift 2;;\n    -f) FMT=\"$2\"; shift 2;;\n    *) shift;;\n  esac\ndone\n",
        );
        script.push_str(&format!(
            "echo \"$IN|$OUT|$SCALE|$MODEL|$FMT\" >> '{}'\n",
            log.display()
        ));
        let redirect = if self.stderr { " >&2" } else { "" };
        for line in &self.lines {
            script.push_str(&format!("echo '{line}'{redirect}\n"));
        }
        if let Some(gate) = &self.gate {
            script.push_str(&format!(
                "while [ ! -f '{}' ]; do sleep 0.05; done\n",
                gate.display()
            ));
        }
        if self.write_output {
            script.push_str("cp \"$IN\" \"$OUT\"\n");
        }
        script.push_str(&format!("exit {}\n", self.exit_code));

        let path = dir.join("fake-upscaler.sh");
        std::fs::write(&path, script).expect("write fake tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake tool");
        path
    }
}

/// Lines of the fake tool's argument log: `input|output|scale|model|format`.
pub fn read_args_log(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// True when `dir` exists and holds no entries.
pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
