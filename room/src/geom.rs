//! Geometry primitives. Stateless predicates over room coordinates.
//!
//! Walls are modelled as axis-aligned segments only. A diagonal segment never
//! matches [`point_near_axis_segment`]; that is a property of the room model,
//! not a missing case.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in room coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Clamp each coordinate into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Point, max: Point) -> Point {
        Point { x: clamp_axis(self.x, min.x, max.x), y: clamp_axis(self.y, min.y, max.y) }
    }

    /// Round both coordinates to whole units.
    #[must_use]
    pub fn round(self) -> Point {
        Point { x: self.x.round(), y: self.y.round() }
    }
}

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Orientation of an axis-aligned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// A straight segment between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// `None` for diagonal segments. A zero-length segment reports `Vertical`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn axis(&self) -> Option<Axis> {
        if self.x1 == self.x2 {
            Some(Axis::Vertical)
        } else if self.y1 == self.y2 {
            Some(Axis::Horizontal)
        } else {
            None
        }
    }
}

/// Inclusive containment: points on the edge are inside.
#[must_use]
pub fn point_in_rect(p: Point, rect: &Rect) -> bool {
    p.x >= rect.x && p.x <= rect.x + rect.width && p.y >= rect.y && p.y <= rect.y + rect.height
}

/// True when `p` lies strictly within `half_width` of the segment's line and
/// inside its span (span ends inclusive).
///
/// The vertical and horizontal cases are tested independently, so a
/// zero-length segment behaves as both.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn point_near_axis_segment(p: Point, seg: &Segment, half_width: f64) -> bool {
    let vertical = seg.x1 == seg.x2 && (p.x - seg.x1).abs() < half_width && within_span(p.y, seg.y1, seg.y2);
    let horizontal = seg.y1 == seg.y2 && (p.y - seg.y1).abs() < half_width && within_span(p.x, seg.x1, seg.x2);
    vertical || horizontal
}

/// True when the centers are closer than `threshold`.
///
/// `threshold` is the full exclusion distance between the two centers, not a
/// per-circle radius.
#[must_use]
pub fn circles_overlap(a: Point, b: Point, threshold: f64) -> bool {
    a.distance_to(b) < threshold
}

fn within_span(v: f64, a: f64, b: f64) -> bool {
    v >= a.min(b) && v <= a.max(b)
}

fn clamp_axis(v: f64, min: f64, max: f64) -> f64 {
    // Degenerate bounds (room narrower than the clamp margin) pin to `min`.
    if max < min {
        return min;
    }
    v.clamp(min, max)
}
