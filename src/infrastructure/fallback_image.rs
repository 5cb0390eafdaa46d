//! Placeholder artifacts for sites that cannot be captured
//!
//! Output depends only on `(name, category)`: the same inputs always produce
//! the same bytes, so a fallback can be regenerated at any time.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

use super::image_processing::{ImageError, encode_jpeg};
use crate::domain::category::color_for_label;
use crate::domain::constants::artifact::ENCODE_QUALITY;
use crate::domain::constants::fallback::{GRADIENT_END, HEIGHT, LABEL_SCALE, NAME_SCALE, WIDTH};

const GLYPH_SIZE: u32 = 8;
const SIDE_MARGIN: u32 = 64;
const NAME_COLOR: [u8; 3] = [0xFF, 0xFF, 0xFF];
const LABEL_COLOR: [u8; 3] = [0xE5, 0xE7, 0xEB];
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy)]
pub struct FallbackImageGenerator {
    width: u32,
    height: u32,
}

impl Default for FallbackImageGenerator {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
        }
    }
}

impl FallbackImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded placeholder for `name` in `category`
    pub fn generate(&self, name: &str, category: &str) -> Result<Vec<u8>, ImageError> {
        encode_jpeg(&self.render(name, category), ENCODE_QUALITY)
    }

    /// Unencoded canvas: diagonal gradient, name at mid-height, category below
    pub fn render(&self, name: &str, category: &str) -> RgbImage {
        let start = color_for_label(category);
        let mut canvas = self.gradient(start);

        self.draw_centered(&mut canvas, name, NAME_SCALE, self.height / 2, NAME_COLOR);
        self.draw_centered(&mut canvas, category, LABEL_SCALE, self.height * 6 / 10, LABEL_COLOR);
        canvas
    }

    fn gradient(&self, start: [u8; 3]) -> RgbImage {
        let span = (self.width - 1 + self.height - 1).max(1) as f32;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let t = (x + y) as f32 / span;
            Rgb(lerp(start, GRADIENT_END, t))
        })
    }

    /// Draw `text` horizontally centered with its vertical center on `center_y`
    fn draw_centered(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        scale: u32,
        center_y: u32,
        color: [u8; 3],
    ) {
        let cell = GLYPH_SIZE * scale;
        let max_chars = (self.width.saturating_sub(2 * SIDE_MARGIN) / cell) as usize;
        let line = fit_line(text, max_chars);
        if line.is_empty() {
            return;
        }

        let text_width = line.chars().count() as u32 * cell;
        let left = self.width.saturating_sub(text_width) / 2;
        let top = center_y.saturating_sub(cell / 2);

        for (i, ch) in line.chars().enumerate() {
            let Some(glyph) = BASIC_FONTS.get(ch) else { continue };
            let origin_x = left + i as u32 * cell;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    fill_block(
                        canvas,
                        origin_x + col * scale,
                        top + row as u32 * scale,
                        scale,
                        Rgb(color),
                    );
                }
            }
        }
    }
}

/// Replace characters the bitmap font lacks with `?` and truncate to
/// `max_chars`, ending in `...` when cut
fn fit_line(text: &str, max_chars: usize) -> String {
    let cleaned: Vec<char> = text
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c
            } else {
                '?'
            }
        })
        .collect();

    if cleaned.len() <= max_chars {
        return cleaned.into_iter().collect();
    }
    if max_chars <= ELLIPSIS.len() {
        return cleaned.into_iter().take(max_chars).collect();
    }

    let mut line: String = cleaned.into_iter().take(max_chars - ELLIPSIS.len()).collect();
    line.truncate(line.trim_end().len());
    line.push_str(ELLIPSIS);
    line
}

fn fill_block(canvas: &mut RgbImage, x: u32, y: u32, size: u32, color: Rgb<u8>) {
    for dy in 0..size {
        for dx in 0..size {
            let (px, py) = (x + dx, y + dy);
            if px < canvas.width() && py < canvas.height() {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

fn lerp(from: [u8; 3], to: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    [mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2])]
}
