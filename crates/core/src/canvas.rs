use std::fmt;
use std::io::Cursor;

use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use thiserror::Error;

/// Size of the placeholder canvas returned when an asset cannot be fetched.
pub const PLACEHOLDER_SIZE: (u32, u32) = (512, 512);

/// Size of the palette canvas.
pub const PALETTE_SIZE: (u32, u32) = (600, 400);

/// Where the placeholder text starts.
pub const PLACEHOLDER_TEXT_ORIGIN: (i32, i32) = (10, 250);

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

const GLYPH_SIZE: u32 = 8;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Invalid font data")]
    InvalidFont,
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Draws a single line of text onto a canvas.
pub enum TextRenderer {
    /// A TrueType/OpenType font rendered at a pixel height.
    Outline { font: FontVec, px: f32 },
    /// The built-in 8x8 bitmap font, each dot scaled to `scale` pixels.
    Bitmap { scale: u32 },
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextRenderer::Outline { px, .. } => f.debug_struct("Outline").field("px", px).finish(),
            TextRenderer::Bitmap { scale } => {
                f.debug_struct("Bitmap").field("scale", scale).finish()
            }
        }
    }
}

impl TextRenderer {
    pub fn outline(font_data: Vec<u8>, px: f32) -> Result<Self, CanvasError> {
        let font = FontVec::try_from_vec(font_data).map_err(|_| CanvasError::InvalidFont)?;
        Ok(TextRenderer::Outline { font, px })
    }

    pub fn builtin(scale: u32) -> Self {
        TextRenderer::Bitmap {
            scale: scale.max(1),
        }
    }

    /// Load a font from raw bytes, or fall back to the built-in font.
    pub fn outline_or_builtin(font_data: Option<Vec<u8>>, px: f32, fallback_scale: u32) -> Self {
        font_data
            .and_then(|data| Self::outline(data, px).ok())
            .unwrap_or_else(|| Self::builtin(fallback_scale))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, TextRenderer::Bitmap { .. })
    }

    /// Width and height of the rendered text box in pixels.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            TextRenderer::Outline { font, px } => {
                let scaled = font.as_scaled(PxScale::from(*px));
                let width = layout(font, *px, text, 0.0, 0.0)
                    .last()
                    .map(|(_, end)| *end)
                    .unwrap_or(0.0);
                (width.ceil() as u32, scaled.height().ceil() as u32)
            }
            TextRenderer::Bitmap { scale } => {
                let chars = text.chars().count() as u32;
                (chars * GLYPH_SIZE * scale, GLYPH_SIZE * scale)
            }
        }
    }

    /// Draw `text` with its top-left corner at (`x`, `y`). Pixels outside the canvas are skipped.
    pub fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        match self {
            TextRenderer::Outline { font, px } => {
                let ascent = font.as_scaled(PxScale::from(*px)).ascent();
                for (glyph, _) in layout(font, *px, text, x as f32, y as f32 + ascent) {
                    let Some(outlined) = font.outline_glyph(glyph) else {
                        continue;
                    };
                    let bounds = outlined.px_bounds();
                    outlined.draw(|gx, gy, coverage| {
                        blend(
                            canvas,
                            bounds.min.x as i32 + gx as i32,
                            bounds.min.y as i32 + gy as i32,
                            color,
                            coverage,
                        );
                    });
                }
            }
            TextRenderer::Bitmap { scale } => {
                let scale = *scale as i32;
                let advance = GLYPH_SIZE as i32 * scale;
                for (i, c) in text.chars().enumerate() {
                    let rows = BASIC_FONTS
                        .get(c)
                        .or_else(|| BASIC_FONTS.get('?'))
                        .unwrap_or([0; 8]);
                    let left = x + i as i32 * advance;
                    for (row, bits) in rows.iter().enumerate() {
                        for col in 0..GLYPH_SIZE as i32 {
                            if bits & (1 << col) == 0 {
                                continue;
                            }
                            for dy in 0..scale {
                                for dx in 0..scale {
                                    blend(
                                        canvas,
                                        left + col * scale + dx,
                                        y + row as i32 * scale + dy,
                                        color,
                                        1.0,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Position each glyph on a baseline, returning the glyph and the caret after it.
fn layout(
    font: &FontVec,
    px: f32,
    text: &str,
    x: f32,
    baseline: f32,
) -> Vec<(ab_glyph::Glyph, f32)> {
    let scaled = font.as_scaled(PxScale::from(px));
    let mut caret = 0.0;
    let mut previous: Option<GlyphId> = None;
    let mut glyphs = Vec::with_capacity(text.len());

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), point(x + caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);
        glyphs.push((glyph, caret));
    }

    glyphs
}

fn blend(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0) {
        *dst = (*dst as f32 * (1.0 - coverage) + src as f32 * coverage).round() as u8;
    }
}

/// White canvas with `text` drawn in black, used whenever an asset is unavailable.
pub fn placeholder(text: &str, renderer: &TextRenderer) -> RgbImage {
    let (width, height) = PLACEHOLDER_SIZE;
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    let (x, y) = PLACEHOLDER_TEXT_ORIGIN;
    renderer.draw(&mut canvas, text, x, y, BLACK);
    canvas
}

/// Horizontal pixel span `[start, end)` of each of `count` bands across `width`.
pub fn band_spans(count: usize, width: u32) -> Vec<(u32, u32)> {
    if count == 0 {
        return Vec::new();
    }
    let count = count as u64;
    (0..count)
        .map(|i| {
            let start = i * width as u64 / count;
            let end = (i + 1) * width as u64 / count;
            (start as u32, end as u32)
        })
        .collect()
}

/// Palette canvas: one vertical band per color with `slogan` centered on top.
///
/// An empty color list yields a white canvas.
pub fn palette_canvas(colors: &[Rgb<u8>], slogan: &str, renderer: &TextRenderer) -> RgbImage {
    let (width, height) = PALETTE_SIZE;
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);

    for ((start, end), color) in band_spans(colors.len(), width).into_iter().zip(colors) {
        for x in start..end {
            for y in 0..height {
                canvas.put_pixel(x, y, *color);
            }
        }
    }

    let (text_width, text_height) = renderer.measure(slogan);
    let x = (width as i32 - text_width as i32) / 2;
    let y = (height as i32 - text_height as i32) / 2;
    renderer.draw(&mut canvas, slogan, x, y, BLACK);

    canvas
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CanvasError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark_pixels(canvas: &RgbImage) -> Vec<(u32, u32)> {
        canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0.iter().all(|c| *c < 64))
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_placeholder_size_and_text_position() {
        let canvas = placeholder("Lumen", &TextRenderer::builtin(2));
        assert_eq!(canvas.dimensions(), PLACEHOLDER_SIZE);

        let dark = dark_pixels(&canvas);
        assert!(!dark.is_empty());
        assert!(dark.iter().all(|(x, y)| *x >= 10 && *y >= 250 && *y < 250 + 16));
        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_placeholder_clips_long_text() {
        let text = "x".repeat(200);
        let canvas = placeholder(&text, &TextRenderer::builtin(2));
        assert_eq!(canvas.dimensions(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn test_band_spans_cover_width() {
        let spans = band_spans(4, 600);
        assert_eq!(spans, vec![(0, 150), (150, 300), (300, 450), (450, 600)]);

        let spans = band_spans(7, 600);
        assert_eq!(spans.first().map(|s| s.0), Some(0));
        assert_eq!(spans.last().map(|s| s.1), Some(600));
        assert!(spans.iter().all(|(start, end)| (85..=86).contains(&(end - start))));

        assert!(band_spans(0, 600).is_empty());
    }

    #[test]
    fn test_palette_canvas_bands() {
        let red = Rgb([255, 0, 0]);
        let blue = Rgb([0, 0, 255]);
        let canvas = palette_canvas(&[red, blue], "", &TextRenderer::builtin(3));

        assert_eq!(canvas.dimensions(), PALETTE_SIZE);
        assert_eq!(*canvas.get_pixel(0, 0), red);
        assert_eq!(*canvas.get_pixel(299, 399), red);
        assert_eq!(*canvas.get_pixel(300, 0), blue);
        assert_eq!(*canvas.get_pixel(599, 399), blue);
    }

    #[test]
    fn test_palette_canvas_centers_slogan() {
        let renderer = TextRenderer::builtin(3);
        let canvas = palette_canvas(&[WHITE], "HELLO", &renderer);
        let dark = dark_pixels(&canvas);
        assert!(!dark.is_empty());

        let (text_width, text_height) = renderer.measure("HELLO");
        let left = (600 - text_width) / 2;
        let top = (400 - text_height) / 2;
        assert!(dark.iter().all(|(x, y)| {
            (left..left + text_width).contains(x) && (top..top + text_height).contains(y)
        }));
    }

    #[test]
    fn test_builtin_measure() {
        let renderer = TextRenderer::builtin(2);
        assert_eq!(renderer.measure("abc"), (48, 16));
        assert_eq!(renderer.measure(""), (0, 16));
        assert!(renderer.is_builtin());
    }

    #[test]
    fn test_builtin_scale_is_at_least_one() {
        assert_eq!(TextRenderer::builtin(0).measure("a"), (8, 8));
    }

    #[test]
    fn test_invalid_font_falls_back_to_builtin() {
        assert!(TextRenderer::outline(vec![0, 1, 2, 3], 32.0).is_err());
        let renderer = TextRenderer::outline_or_builtin(Some(vec![0, 1, 2, 3]), 32.0, 3);
        assert!(renderer.is_builtin());
        assert!(TextRenderer::outline_or_builtin(None, 32.0, 3).is_builtin());
    }

    #[test]
    fn test_encode_png_signature() {
        let image = DynamicImage::ImageRgb8(placeholder("x", &TextRenderer::builtin(1)));
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
