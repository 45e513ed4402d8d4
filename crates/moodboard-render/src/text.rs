//! Text layout and rasterization.
//!
//! Lines are laid out at a fixed reference font size and rendered into an
//! offscreen block; the painter then scales that block anisotropically into
//! the item's frame. Stored text metrics therefore never depend on the
//! frame's pixel size.
//!
//! A system font is looked up from well-known locations. Without one,
//! measurement falls back to the approximate metric tables and glyph
//! painting is skipped; background boxes still render and output stays
//! deterministic.

use ab_glyph::{FontArc, PxScale};
use image::{Rgba as ImageRgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use moodboard_core::item::{REFERENCE_FONT_SIZE, TEXT_LINE_HEIGHT, TEXT_PADDING};
use moodboard_core::{FontWeight, Rgba};
use tiny_skia::Pixmap;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/SFNS.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Probe well-known locations for a usable font.
pub fn load_system_font() -> Option<FontArc> {
    for path in FONT_CANDIDATES {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                log::debug!("using system font {path}");
                return Some(font);
            }
        }
    }
    log::warn!("no system font found; text items will render without glyphs");
    None
}

/// Reference-size layout of a text block.
pub struct TextLayout {
    pub lines: Vec<String>,
    pub line_widths: Vec<f64>,
    /// Full block width including padding.
    pub width: f64,
    /// Full block height including padding.
    pub height: f64,
    pub padding: f64,
    pub line_height: f64,
}

/// Lay out a text block at the reference font size.
pub fn layout_text(
    text: &str,
    weight: FontWeight,
    has_background: bool,
    font: Option<&FontArc>,
) -> TextLayout {
    let scale = PxScale::from(REFERENCE_FONT_SIZE as f32);
    let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let line_widths: Vec<f64> = lines
        .iter()
        .map(|line| match font {
            Some(font) if !line.is_empty() => f64::from(text_size(scale, font, line).0),
            _ => line.chars().count() as f64 * REFERENCE_FONT_SIZE * weight.advance_factor(),
        })
        .collect();
    let padding = if has_background { TEXT_PADDING } else { 0.0 };
    let line_height = REFERENCE_FONT_SIZE * TEXT_LINE_HEIGHT;
    let content_width = line_widths.iter().copied().fold(0.0, f64::max).max(1.0);
    TextLayout {
        height: lines.len().max(1) as f64 * line_height + 2.0 * padding,
        width: content_width + 2.0 * padding,
        lines,
        line_widths,
        padding,
        line_height,
    }
}

/// Render a laid-out block into a pixmap: background first (when set), then
/// each line centered horizontally, stacked top to bottom.
pub fn rasterize_block(
    layout: &TextLayout,
    color: Rgba,
    background: Option<Rgba>,
    weight: FontWeight,
    font: Option<&FontArc>,
) -> Option<Pixmap> {
    let width = layout.width.ceil().max(1.0) as u32;
    let height = layout.height.ceil().max(1.0) as u32;
    let mut image = match background {
        Some(bg) => RgbaImage::from_pixel(width, height, ImageRgba([bg.r, bg.g, bg.b, bg.a])),
        None => RgbaImage::new(width, height),
    };

    if let Some(font) = font {
        let scale = PxScale::from(REFERENCE_FONT_SIZE as f32);
        let pixel = ImageRgba([color.r, color.g, color.b, color.a]);
        for (index, line) in layout.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let x = ((layout.width - layout.line_widths[index]) / 2.0).round() as i32;
            let y = (layout.padding
                + index as f64 * layout.line_height
                + (layout.line_height - REFERENCE_FONT_SIZE) / 2.0)
                .round() as i32;
            draw_text_mut(&mut image, pixel, x, y, scale, font, line);
            if weight == FontWeight::Bold {
                // One font face on hand; bold is synthesized by double
                // striking one pixel over.
                draw_text_mut(&mut image, pixel, x + 1, y, scale, font, line);
            }
        }
    }

    crate::decode::pixmap_from_rgba(&image)
}
