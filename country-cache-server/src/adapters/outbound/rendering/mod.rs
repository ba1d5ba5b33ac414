//! PNG rendering of the summary layout.

mod font;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

use crate::domain::models::{SummaryLayout, TextLine};
use crate::errors::RenderError;
use crate::ports::Renderer;

const BACKGROUND: Rgb<u8> = Rgb([24, 32, 48]);
const HEADER: Rgb<u8> = Rgb([44, 62, 94]);
const TEXT: Rgb<u8> = Rgb([236, 240, 245]);
const HEADER_HEIGHT: u32 = 72;

/// Draws layouts with an embedded bitmap font and encodes them as PNG.
#[derive(Debug, Default, Clone)]
pub struct PngRenderer;

impl PngRenderer {
    pub fn new() -> Self {
        Self
    }

    fn draw_line(canvas: &mut RgbImage, line: &TextLine) {
        let scale = line.scale.max(1);
        let advance = (font::GLYPH_WIDTH + 1) * scale;

        for (idx, ch) in line.text.chars().enumerate() {
            let origin_x = line.x.saturating_add(idx as u32 * advance);
            if origin_x >= canvas.width() {
                break;
            }
            Self::draw_glyph(canvas, font::glyph(ch), origin_x, line.y, scale);
        }
    }

    fn draw_glyph(canvas: &mut RgbImage, rows: &[u8; 7], x: u32, y: u32, scale: u32) {
        for (row_idx, bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = x + col * scale;
                let py = y + row_idx as u32 * scale;
                fill_rect(canvas, px, py, scale, scale, TEXT);
            }
        }
    }
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(canvas.width());
    let y_end = y.saturating_add(h).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

impl Renderer for PngRenderer {
    fn render(&self, layout: &SummaryLayout) -> Result<Vec<u8>, RenderError> {
        if layout.width == 0 || layout.height == 0 {
            return Err(RenderError::Canvas(format!(
                "invalid canvas size {}x{}",
                layout.width, layout.height
            )));
        }

        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);
        fill_rect(&mut canvas, 0, 0, layout.width, HEADER_HEIGHT, HEADER);

        for line in &layout.lines {
            Self::draw_line(&mut canvas, line);
        }

        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            canvas.as_raw(),
            layout.width,
            layout.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}
