//! Screenshot post-processing
//!
//! Raw browser bitmaps are unbounded in height and arrive as PNG. Every stored
//! artifact goes through [`ImagePostProcessor::process`], which crops to the
//! configured bounds and re-encodes at one fixed JPEG quality.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbImage};
use thiserror::Error;

use crate::domain::constants::artifact::ENCODE_QUALITY;

/// Post-processing and fallback encoding failures
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("empty image data")]
    Empty,

    #[error("failed to decode screenshot: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode artifact: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to read screenshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds applied to a raw bitmap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Keep only the top `max_height` rows
    pub max_height: Option<u32>,
    /// Keep only the top-left `width x height` region
    pub clip: Option<(u32, u32)>,
}

impl ProcessOptions {
    pub const fn with_max_height(max_height: u32) -> Self {
        Self {
            max_height: Some(max_height),
            clip: None,
        }
    }

    pub const fn with_clip(width: u32, height: u32) -> Self {
        Self {
            max_height: None,
            clip: Some((width, height)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImagePostProcessor {
    quality: u8,
}

impl Default for ImagePostProcessor {
    fn default() -> Self {
        Self {
            quality: ENCODE_QUALITY,
        }
    }
}

impl ImagePostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode, crop and re-encode.
    ///
    /// Cropping never scales: an over-tall page keeps its top rows at full
    /// resolution and a bitmap already inside the bounds is left as is.
    pub fn process(&self, raw: &[u8], options: &ProcessOptions) -> Result<Vec<u8>, ImageError> {
        if raw.is_empty() {
            return Err(ImageError::Empty);
        }

        let img = ImageReader::new(Cursor::new(raw))
            .with_guessed_format()?
            .decode()
            .map_err(ImageError::Decode)?;

        let img = crop_to_bounds(img, options);
        encode_jpeg(&img.to_rgb8(), self.quality)
    }
}

fn crop_to_bounds(img: DynamicImage, options: &ProcessOptions) -> DynamicImage {
    let (mut width, mut height) = (img.width(), img.height());

    if let Some(max_height) = options.max_height {
        height = height.min(max_height);
    }
    if let Some((clip_w, clip_h)) = options.clip {
        width = width.min(clip_w);
        height = height.min(clip_h);
    }

    if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.crop_imm(0, 0, width, height)
    }
}

/// Encode an RGB buffer as JPEG at `quality`
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(img)
        .map_err(ImageError::Encode)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img =
            RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn dimensions(jpeg: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn tall_page_is_cropped_from_the_top() {
        let processor = ImagePostProcessor::new();
        let options = ProcessOptions::with_max_height(12_000);
        let out = processor.process(&png(64, 20_000), &options).unwrap();
        assert_eq!(dimensions(&out), (64, 12_000));
    }

    #[test]
    fn short_page_is_not_scaled() {
        let processor = ImagePostProcessor::new();
        let options = ProcessOptions::with_max_height(12_000);
        let out = processor.process(&png(64, 300), &options).unwrap();
        assert_eq!(dimensions(&out), (64, 300));
    }

    #[test]
    fn clip_keeps_top_left_region() {
        let processor = ImagePostProcessor::new();
        let options = ProcessOptions::with_clip(1280, 720);
        let out = processor.process(&png(1600, 1000), &options).unwrap();
        assert_eq!(dimensions(&out), (1280, 720));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let processor = ImagePostProcessor::new();
        let options = ProcessOptions::default();
        assert!(matches!(processor.process(b"", &options), Err(ImageError::Empty)));
        assert!(processor.process(b"<html>blocked</html>", &options).is_err());
    }

    #[test]
    fn output_is_jpeg() {
        let out = ImagePostProcessor::new()
            .process(&png(8, 8), &ProcessOptions::default())
            .unwrap();
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
    }
}
