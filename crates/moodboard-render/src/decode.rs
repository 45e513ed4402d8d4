//! Image codec boundary: decoding stored assets into pixmaps and encoding
//! raw bytes into the durable base64 form items carry.

use crate::{RenderError, RenderResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use tiny_skia::Pixmap;

/// A decoded raster with its intrinsic pixel size.
pub struct DecodedImage {
    pub pixmap: Pixmap,
    pub width: u32,
    pub height: u32,
}

/// Decode encoded image bytes (PNG, JPEG or WebP; the format is detected
/// from the content).
pub fn decode_image(bytes: &[u8]) -> RenderResult<DecodedImage> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixmap = pixmap_from_rgba(&rgba)
        .ok_or_else(|| RenderError::Decode("zero-sized image".to_string()))?;
    Ok(DecodedImage {
        pixmap,
        width,
        height,
    })
}

/// Decode an item's stored base64 asset.
pub fn decode_asset(data: &str) -> RenderResult<DecodedImage> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| RenderError::Decode(e.to_string()))?;
    decode_image(&bytes)
}

/// Base64-encode raw image bytes into the durable form items carry.
pub fn encode_asset(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Convert a straight-alpha RGBA image into a premultiplied pixmap.
pub(crate) fn pixmap_from_rgba(rgba: &RgbaImage) -> Option<Pixmap> {
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (pixel, out) in rgba.pixels().zip(pixmap.pixels_mut()) {
        let [r, g, b, a] = pixel.0;
        *out = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}
