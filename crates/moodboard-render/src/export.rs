//! Flattened export: the scene painted over an opaque white background at
//! the canvas pixel size, no selection decoration, encoded as PNG.

use crate::painter::paint_scene;
use crate::raster_cache::RasterCache;
use crate::{RenderError, RenderResult};
use ab_glyph::FontArc;
use image::RgbaImage;
use moodboard_core::Board;
use tiny_skia::{Color, Pixmap};

/// Rasterize the board onto an opaque white surface of the given size,
/// using the same per-item routine as the on-screen pass.
pub fn flatten(
    board: &Board,
    width: u32,
    height: u32,
    font: Option<&FontArc>,
) -> RenderResult<Pixmap> {
    let mut pixmap = Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| RenderError::Surface("failed to allocate export surface".to_string()))?;
    let mut cache = RasterCache::new();
    paint_scene(&mut pixmap, &mut cache, font, board, None, Color::WHITE);
    Ok(pixmap)
}

/// Encode a pixmap as PNG bytes.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let rgba = RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| RenderError::Encode("buffer size mismatch".to_string()))?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Flatten and PNG-encode in one step.
pub fn export_png(
    board: &Board,
    width: u32,
    height: u32,
    font: Option<&FontArc>,
) -> RenderResult<Vec<u8>> {
    let pixmap = flatten(board, width, height, font)?;
    encode_png(&pixmap)
}
