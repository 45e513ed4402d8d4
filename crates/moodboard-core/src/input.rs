//! Pointer event plumbing.
//!
//! Gestures are single-pointer: the embedder forwards only the primary
//! touch/mouse events and drops any second concurrent touch point. Move and
//! up events must keep arriving even after the pointer leaves the canvas,
//! so hosts register them on the surrounding input surface.

use kurbo::Point;
use std::time::Instant;

/// A unified mouse/touch event in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
}

const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks pointer position and detects double-activation.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pointer_position: Point,
    last_down_time: Option<Instant>,
    last_down_position: Option<Point>,
    double_click: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_position(&self) -> Point {
        self.pointer_position
    }

    /// Whether the most recent down event completed a double-activation.
    pub fn is_double_click(&self) -> bool {
        self.double_click
    }

    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down { position } => {
                self.pointer_position = position;
                self.double_click = false;
                let now = Instant::now();
                if let (Some(last_time), Some(last_pos)) =
                    (self.last_down_time, self.last_down_position)
                {
                    let elapsed = now.duration_since(last_time).as_millis();
                    if elapsed < DOUBLE_CLICK_TIME_MS
                        && position.distance(last_pos) < DOUBLE_CLICK_DISTANCE
                    {
                        self.double_click = true;
                        // Reset so a triple click does not read as two doubles.
                        self.last_down_time = None;
                        self.last_down_position = None;
                        return;
                    }
                }
                self.last_down_time = Some(now);
                self.last_down_position = Some(position);
            }
            PointerEvent::Move { position } | PointerEvent::Up { position } => {
                self.pointer_position = position;
            }
        }
    }
}
