#![forbid(unsafe_code)]

//! Geometric primitives in viewport pixel space.
//!
//! Coordinates are CSS pixels relative to the top-left corner of the visible
//! viewport, matching what `getBoundingClientRect()` reports. Widths and
//! heights are never negative: every constructor clamps them to zero.

/// A rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Top edge (inclusive).
    pub top: f64,
    /// Left edge (inclusive).
    pub left: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle. Negative or NaN extents become zero.
    #[inline]
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width: non_negative(width),
            height: non_negative(height),
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Horizontal centre.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Vertical centre.
    #[inline]
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Check if a point is inside the rectangle (right/bottom edges excluded).
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }

    /// Grow the rectangle by `amount` on every side.
    ///
    /// Negative amounts shrink it; the extents never drop below zero.
    #[must_use]
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(
            self.top - amount,
            self.left - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size. Negative or NaN extents become zero.
    #[inline]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: non_negative(width),
            height: non_negative(height),
        }
    }
}

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[inline]
fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
