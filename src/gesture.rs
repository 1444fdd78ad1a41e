// SPDX-License-Identifier: GPL-3.0-only

use crate::geometry::Rect;

/// Drags with either side under this many pixels mean "no explicit region".
pub const MIN_DRAG_PX: f32 = 5.0;

/// Turns raw pointer events into a normalized selection rectangle.
///
/// The anchor corner is set on [`begin`](DragTracker::begin); every
/// [`update`](DragTracker::update) recomputes the live rectangle from the
/// anchor and the current pointer, tolerant of negative drag direction.
#[derive(Debug, Default)]
pub struct DragTracker {
    anchor: Option<(f32, f32)>,
}

impl DragTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    /// Record the anchor corner and activate the tracker.
    pub fn begin(&mut self, x: f32, y: f32) {
        self.anchor = Some((x, y));
    }

    /// Live rectangle for visual feedback; `None` while inactive.
    pub fn update(&mut self, x: f32, y: f32) -> Option<Rect> {
        let (ax, ay) = self.anchor?;
        Some(Rect::from_points(ax, ay, x, y))
    }

    /// Finalize the rectangle and deactivate; `None` while inactive.
    ///
    /// The returned rectangle may be below [`MIN_DRAG_PX`]; callers must
    /// treat that as "use the full frame", not as an error.
    pub fn end(&mut self, x: f32, y: f32) -> Option<Rect> {
        let (ax, ay) = self.anchor.take()?;
        Some(Rect::from_points(ax, ay, x, y))
    }

    /// Clear state without producing a rectangle.
    pub fn cancel(&mut self) {
        self.anchor = None;
    }
}
