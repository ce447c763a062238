//! Output and staging file names. Timestamps have microsecond resolution so
//! jobs run one after another never collide in the shared output directory.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::consts::TIMESTAMP_FORMAT;
use crate::job::OutputFormat;

/// Current local time formatted as `YYYYmmddHHMMSSffffff`.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `<dir>/output_<scale>_<timestamp>.<format>`
pub fn upscale_output_path(dir: &Path, scale: u32, stamp: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("output_{scale}_{stamp}.{}", format.extension()))
}

/// `<dir>/enhanced_<timestamp>.<format>`
pub fn restore_output_path(dir: &Path, stamp: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("enhanced_{stamp}.{}", format.extension()))
}

/// `<dir>/temp_<timestamp>.jpg`
pub fn staged_input_path(dir: &Path, stamp: &str) -> PathBuf {
    dir.join(format!("temp_{stamp}.jpg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_has_microseconds() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 20, "got: {stamp}");
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_output_names() {
        let dir = Path::new("output");
        assert_eq!(
            upscale_output_path(dir, 2, "123", OutputFormat::Webp),
            PathBuf::from("output/output_2_123.webp")
        );
        assert_eq!(
            restore_output_path(dir, "123", OutputFormat::Jpg),
            PathBuf::from("output/enhanced_123.jpg")
        );
    }
}
