use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};

use crate::job::OutputFormat;

/// Metadata about a source image, read without a full decode.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    /// Container format guessed from the file contents.
    pub format: Option<ImageFormat>,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
}

impl SourceInfo {
    pub fn has_alpha(&self) -> bool {
        self.color.has_alpha()
    }
}

/// Read format, dimensions and colour type of an image file.
pub fn probe_image(path: &Path) -> image::ImageResult<SourceInfo> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let decoder = reader.into_decoder()?;
    let (width, height) = image::ImageDecoder::dimensions(&decoder);
    let color = image::ImageDecoder::color_type(&decoder);
    Ok(SourceInfo {
        format,
        width,
        height,
        color,
    })
}

/// Guess the container format of a file from its contents, falling back to the extension.
pub fn guess_format(path: &Path) -> Option<ImageFormat> {
    ImageReader::open(path)
        .ok()
        .and_then(|r| r.with_guessed_format().ok())
        .and_then(|r| r.format())
        .or_else(|| ImageFormat::from_path(path).ok())
}

/// Decode an image file.
pub fn load_image(path: &Path) -> image::ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Encode an image in the given output format.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
/// WebP is written from 8-bit RGB(A).
pub fn save_image(img: &DynamicImage, path: &Path, format: OutputFormat) -> image::ImageResult<()> {
    match format {
        OutputFormat::Jpg => {
            DynamicImage::ImageRgb8(img.to_rgb8()).save_with_format(path, ImageFormat::Jpeg)
        }
        OutputFormat::Png => img.save_with_format(path, ImageFormat::Png),
        OutputFormat::Webp => {
            let converted = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            converted.save_with_format(path, ImageFormat::WebP)
        }
    }
}
