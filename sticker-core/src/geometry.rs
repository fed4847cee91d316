//! Points and rectangles in canvas pixel space.

use serde::{Deserialize, Serialize};

/// A point (or offset) in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Component-wise `self - other`.
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise `self + other`.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square with top-left at `origin`.
    #[must_use]
    pub const fn square(origin: Point, side: f32) -> Self {
        Self::new(origin.x, origin.y, side, side)
    }

    /// Top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is within this rectangle. Both edges are inclusive.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_point_is_edge_inclusive() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains_point(10.0, 20.0));
        assert!(rect.contains_point(110.0, 70.0));
        assert!(!rect.contains_point(110.5, 70.0));
        assert!(!rect.contains_point(9.9, 30.0));
    }

    #[test]
    fn center_of_square() {
        let rect = Rect::square(Point::new(240.0, 240.0), 100.0);
        assert_eq!(rect.center(), Point::new(290.0, 290.0));
    }
}
