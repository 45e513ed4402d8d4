//! Moodboard render pipeline.
//!
//! CPU rasterization of a board into a [`tiny_skia::Pixmap`]: one full
//! clear-and-repaint per draw, the same per-item routine for on-screen
//! preview and flattened export, and PNG encoding for the export path.

pub mod decode;
pub mod export;
pub mod painter;
pub mod raster_cache;
pub mod text;

pub use decode::{decode_asset, decode_image, encode_asset, DecodedImage};
pub use export::{export_png, flatten};
pub use painter::Painter;
pub use raster_cache::RasterCache;

use thiserror::Error;

/// Render pipeline errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("surface error: {0}")]
    Surface(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
