//! Gesture state machine: select, drag, and the combined resize+rotate
//! transform, all driven from single-pointer events.
//!
//! The machine never owns the board; the controller lends it mutable access
//! per event and acts on the returned outcome (persist, redraw, open a
//! source URL).

use crate::board::Board;
use crate::geometry::{self, MIN_ITEM_SIZE};
use crate::item::{FontWeight, ItemId, ItemKind, Rgba};
use kurbo::Point;

/// Snapshot taken when a transform gesture begins. All per-frame updates are
/// computed against this origin, never incrementally, so the size can catch
/// back up after bottoming out at the minimum.
#[derive(Debug, Clone, Copy)]
struct TransformOrigin {
    center: Point,
    width: f64,
    height: f64,
    rotation: f64,
    pointer_angle: f64,
    pointer_dist: f64,
}

#[derive(Debug, Clone, Copy, Default)]
enum Gesture {
    #[default]
    Idle,
    Dragging {
        origin: Point,
    },
    Transforming(TransformOrigin),
}

/// Editing attributes of a text item, surfaced to the controller when the
/// item becomes the active selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAttributes {
    pub text: String,
    pub color: Rgba,
    pub background: Option<Rgba>,
    pub weight: FontWeight,
}

/// What a pointer-down resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum DownOutcome {
    /// The selected item's link glyph was hit; no state changed.
    OpenSource(String),
    /// The selected item's handle was hit; a transform gesture began.
    TransformStarted { id: ItemId },
    /// An item body was hit; it was selected, brought to front, and a drag
    /// began.
    DragStarted {
        id: ItemId,
        text: Option<TextAttributes>,
    },
    /// Empty canvas; the selection was cleared.
    SelectionCleared,
}

/// The interaction state machine with its orthogonal selection slot.
#[derive(Debug, Default)]
pub struct Interaction {
    gesture: Gesture,
    start: Point,
    selection: Option<ItemId>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<ItemId> {
        self.selection.clone()
    }

    /// Restore the selection slot (startup only; does not persist).
    pub fn set_selection(&mut self, selection: Option<ItemId>) {
        self.selection = selection;
    }

    /// Whether a transform gesture is in progress (drives the handle color).
    pub fn is_transforming(&self) -> bool {
        matches!(self.gesture, Gesture::Transforming(_))
    }

    /// Whether any gesture is in progress.
    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Resolve a pointer-down. Resolution order: the selected item's link
    /// glyph, then its handle, then a topmost-first body scan.
    pub fn pointer_down(&mut self, board: &mut Board, point: Point) -> DownOutcome {
        self.start = point;

        if let Some(selected) = self.selection.clone() {
            if let Some(item) = board.find(&selected) {
                if let Some(url) = item.source_url() {
                    if geometry::hits_link_glyph(&item.frame, point) {
                        return DownOutcome::OpenSource(url.to_string());
                    }
                }
                if geometry::hits_handle(&item.frame, point) {
                    let frame = item.frame;
                    let center = frame.center();
                    self.gesture = Gesture::Transforming(TransformOrigin {
                        center,
                        width: frame.width,
                        height: frame.height,
                        rotation: frame.rotation,
                        pointer_angle: (point.y - center.y).atan2(point.x - center.x),
                        pointer_dist: point.distance(center),
                    });
                    return DownOutcome::TransformStarted { id: selected };
                }
            }
        }

        if let Some(id) = board.topmost_at(point) {
            board.bring_to_front(&id);
            if let Some(item) = board.find(&id) {
                self.selection = Some(id.clone());
                self.gesture = Gesture::Dragging {
                    origin: Point::new(item.frame.x, item.frame.y),
                };
                let text = match &item.kind {
                    ItemKind::Text {
                        text,
                        color,
                        background,
                        weight,
                    } => Some(TextAttributes {
                        text: text.clone(),
                        color: *color,
                        background: *background,
                        weight: *weight,
                    }),
                    ItemKind::Image { .. } => None,
                };
                return DownOutcome::DragStarted { id, text };
            }
        }

        self.selection = None;
        self.gesture = Gesture::Idle;
        DownOutcome::SelectionCleared
    }

    /// Apply a pointer-move to the active gesture. Returns true when item
    /// geometry changed.
    pub fn pointer_move(&mut self, board: &mut Board, point: Point) -> bool {
        let Some(selected) = self.selection.clone() else {
            return false;
        };
        match self.gesture {
            Gesture::Idle => false,
            Gesture::Dragging { origin } => {
                let Some(item) = board.find_mut(&selected) else {
                    return false;
                };
                let delta = point - self.start;
                item.frame.x = origin.x + delta.x;
                item.frame.y = origin.y + delta.y;
                true
            }
            Gesture::Transforming(origin) => {
                let Some(item) = board.find_mut(&selected) else {
                    return false;
                };
                let angle = (point.y - origin.center.y).atan2(point.x - origin.center.x);
                item.frame.rotation = origin.rotation + (angle - origin.pointer_angle);

                // A degenerate grab at the exact center leaves the scale
                // inert for the whole gesture instead of propagating NaN.
                if origin.pointer_dist > f64::EPSILON {
                    let scale = point.distance(origin.center) / origin.pointer_dist;
                    let width = origin.width * scale;
                    let height = origin.height * scale;
                    if width > MIN_ITEM_SIZE && height > MIN_ITEM_SIZE {
                        item.frame.width = width;
                        item.frame.height = height;
                    }
                }

                item.frame.x = origin.center.x - item.frame.width / 2.0;
                item.frame.y = origin.center.y - item.frame.height / 2.0;
                true
            }
        }
    }

    /// End the active gesture. Returns true when a drag or transform was in
    /// progress, meaning the scene should be persisted.
    pub fn pointer_up(&mut self) -> bool {
        let committed = self.is_gesture_active() && self.selection.is_some();
        self.gesture = Gesture::Idle;
        committed
    }

    /// Remove the selected item. Returns its id when something was deleted.
    pub fn delete_selected(&mut self, board: &mut Board) -> Option<ItemId> {
        let selected = self.selection.take()?;
        self.gesture = Gesture::Idle;
        match board.remove(&selected) {
            Some(_) => Some(selected),
            None => None,
        }
    }
}
