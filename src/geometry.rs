// SPDX-License-Identifier: GPL-3.0-only

//! Rectangles and coordinate-space mapping.
//!
//! A [`Rect`] is always normalized: non-negative width and height with the
//! origin at the minimum corner. The same struct is used in screen space
//! (live capture), display space (the scaled-down preview) and source space
//! (the full-resolution image); which space a value lives in is part of each
//! API's contract.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two corner points, in either drag
    /// direction.
    #[must_use]
    pub fn from_points(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (bx - ax).abs(),
            height: (by - ay).abs(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True when either side is under `threshold` pixels. Callers treat
    /// such rectangles as "no explicit region", never as an error.
    #[must_use]
    pub fn below_threshold(&self, threshold: f32) -> bool {
        self.width < threshold || self.height < threshold
    }

    #[must_use]
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Intersection with `other`, or `None` when they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Clamp into `[0, width] x [0, height]`. Drags can extend past the
    /// surface edge; the clamped rectangle may end up empty.
    #[must_use]
    pub fn clamp_to(&self, width: f32, height: f32) -> Rect {
        let x = self.x.clamp(0.0, width);
        let y = self.y.clamp(0.0, height);
        let right = (self.x + self.width).clamp(0.0, width);
        let bottom = (self.y + self.height).clamp(0.0, height);
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    /// Whether `self` fits entirely inside `other`.
    #[must_use]
    pub fn fits_within(&self, other: &Rect) -> bool {
        other.contains(self.x, self.y)
            && self.x + self.width <= other.x + other.width
            && self.y + self.height <= other.y + other.height
    }
}

/// Scale a rectangle between coordinate spaces.
///
/// Each field is multiplied by `scale` and rounded to the nearest integer
/// pixel, since source buffers are integer addressed. Mapping display to
/// source and back with the inverse scale lands within one pixel of the
/// input on every field.
#[must_use]
pub fn map_rect(rect: Rect, scale: f32) -> Rect {
    Rect {
        x: (rect.x * scale).round(),
        y: (rect.y * scale).round(),
        width: (rect.width * scale).round(),
        height: (rect.height * scale).round(),
    }
}
