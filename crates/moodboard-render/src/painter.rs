//! The painter: one full clear-and-repaint per draw call.
//!
//! `draw` is idempotent and has no side effects beyond the pixmap pixels;
//! the flattened export reuses the exact same per-item routine against its
//! own surface, which is what keeps preview and export pixel-identical.

use crate::raster_cache::RasterCache;
use crate::text;
use crate::{RenderError, RenderResult};
use ab_glyph::FontArc;
use moodboard_core::{
    Board, Frame, Item, ItemKind, RenderHost, SceneView, HANDLE_SIZE, LINK_GLYPH_SIZE,
};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

/// Software renderer over a `tiny_skia` pixmap.
pub struct Painter {
    pixmap: Pixmap,
    background: Color,
    cache: RasterCache,
    font: Option<FontArc>,
}

impl Painter {
    /// Create a painter with a surface of the given pixel size and a system
    /// font if one can be found.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| RenderError::Surface("failed to allocate surface".to_string()))?;
        Ok(Self {
            pixmap,
            background: Color::TRANSPARENT,
            cache: RasterCache::new(),
            font: text::load_system_font(),
        })
    }

    /// Use a specific font instead of the system lookup.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Background the surface is cleared to before each pass (transparent
    /// by default; the page behind the canvas shows through).
    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }

    /// Repaint the whole scene.
    pub fn draw(&mut self, board: &Board, view: &SceneView) {
        self.cache.prune(board);
        paint_scene(
            &mut self.pixmap,
            &mut self.cache,
            self.font.as_ref(),
            board,
            Some(view),
            self.background,
        );
    }
}

impl RenderHost for Painter {
    fn resize(&mut self, width: u32, height: u32) {
        if let Some(pixmap) = Pixmap::new(width.max(1), height.max(1)) {
            self.pixmap = pixmap;
        }
    }

    fn redraw(&mut self, board: &Board, view: &SceneView) {
        self.draw(board, view);
    }
}

/// Clear and paint every item in z-order. Selection decoration is painted
/// right after the selected item, like the items themselves subject to
/// occlusion by anything above; the export path passes no view and gets
/// none.
pub(crate) fn paint_scene(
    pixmap: &mut Pixmap,
    cache: &mut RasterCache,
    font: Option<&FontArc>,
    board: &Board,
    decoration: Option<&SceneView>,
    background: Color,
) {
    pixmap.fill(background);
    for item in board.items() {
        paint_item(pixmap, cache, font, item);
        if let Some(view) = decoration {
            if view.selection.as_ref() == Some(&item.id) {
                paint_selection(pixmap, item, view.transforming);
            }
        }
    }
}

fn paint_item(pixmap: &mut Pixmap, cache: &mut RasterCache, font: Option<&FontArc>, item: &Item) {
    match &item.kind {
        ItemKind::Image { .. } => {
            if let Some(decoded) = cache.get(item) {
                draw_raster(pixmap, &item.frame, &decoded.pixmap);
            }
        }
        ItemKind::Text {
            text: content,
            color,
            background,
            weight,
        } => {
            let layout = text::layout_text(content, *weight, background.is_some(), font);
            if let Some(block) = text::rasterize_block(&layout, *color, *background, *weight, font)
            {
                draw_raster(pixmap, &item.frame, &block);
            }
        }
    }
}

/// Draw a source raster stretched into the rotated frame: translate to the
/// box center, rotate, then scale the source onto `(width, height)`.
fn draw_raster(pixmap: &mut Pixmap, frame: &Frame, source: &Pixmap) {
    let sx = (frame.width / f64::from(source.width())) as f32;
    let sy = (frame.height / f64::from(source.height())) as f32;
    let center = frame.center();
    let transform = Transform::from_scale(sx, sy)
        .post_translate((-frame.width / 2.0) as f32, (-frame.height / 2.0) as f32)
        .post_concat(Transform::from_rotate(frame.rotation.to_degrees() as f32))
        .post_translate(center.x as f32, center.y as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
}

/// Preview-only decoration: stroked bounds, the resize/rotate handle, and
/// the link glyph for items with a source URL.
fn paint_selection(pixmap: &mut Pixmap, item: &Item, transforming: bool) {
    let frame = &item.frame;
    let center = frame.center();
    let place = Transform::from_rotate(frame.rotation.to_degrees() as f32)
        .post_translate(center.x as f32, center.y as f32);
    let half_w = (frame.width / 2.0) as f32;
    let half_h = (frame.height / 2.0) as f32;

    let mut border = Paint::default();
    border.set_color_rgba8(0x4f, 0x46, 0xe5, 0xff);
    border.anti_alias = true;

    if let Some(rect) = Rect::from_xywh(-half_w, -half_h, frame.width as f32, frame.height as f32)
    {
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &border, &stroke, place, None);
    }

    let hs = HANDLE_SIZE as f32;
    if let Some(rect) = Rect::from_xywh(half_w - hs / 2.0, half_h - hs / 2.0, hs, hs) {
        let path = PathBuilder::from_rect(rect);
        let mut fill = Paint::default();
        fill.anti_alias = true;
        if transforming {
            fill.set_color_rgba8(0xef, 0x44, 0x44, 0xff);
        } else {
            fill.set_color_rgba8(0x3b, 0x82, 0xf6, 0xff);
        }
        pixmap.fill_path(&path, &fill, FillRule::Winding, place, None);

        let mut outline = Paint::default();
        outline.set_color_rgba8(0xff, 0xff, 0xff, 0xff);
        outline.anti_alias = true;
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &outline, &stroke, place, None);
    }

    if item.source_url().is_some() {
        paint_link_glyph(pixmap, half_w, half_h, place, &border);
    }
}

fn paint_link_glyph(
    pixmap: &mut Pixmap,
    half_w: f32,
    half_h: f32,
    place: Transform,
    border: &Paint,
) {
    let gs = LINK_GLYPH_SIZE as f32;
    let Some(rect) = Rect::from_xywh(half_w - gs, -half_h, gs, gs) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let mut fill = Paint::default();
    fill.set_color_rgba8(0xff, 0xff, 0xff, 0xe6);
    fill.anti_alias = true;
    pixmap.fill_path(&path, &fill, FillRule::Winding, place, None);
    let thin = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, border, &thin, place, None);

    // North-east arrow inside the square.
    let cx = half_w - gs / 2.0;
    let cy = -half_h + gs / 2.0;
    let r = gs * 0.25;
    let head = gs * 0.2;
    let mut pb = PathBuilder::new();
    pb.move_to(cx - r, cy + r);
    pb.line_to(cx + r, cy - r);
    pb.move_to(cx + r - head, cy - r);
    pb.line_to(cx + r, cy - r);
    pb.line_to(cx + r, cy - r + head);
    if let Some(arrow) = pb.finish() {
        let stroke = Stroke {
            width: 1.5,
            ..Stroke::default()
        };
        pixmap.stroke_path(&arrow, border, &stroke, place, None);
    }
}
