//! Foundation types shared by every layer of the raster core.
//!
//! Rectangles use inclusive corners (`x1..=x2`, `y1..=y2`), so a single
//! pixel is `Rect::new(x, y, x, y)`. A rectangle with `x1 > x2` or
//! `y1 > y2` is empty.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Tile-grid arithmetic
// ============================================================================

/// Integer division rounding toward negative infinity.
///
/// `floor_div(-1, 64) == -1`, whereas `-1 / 64 == 0`. Tile lookups must use
/// this so that pixels left of or above the origin land in negative tiles.
#[inline]
pub fn floor_div(v: i32, d: i32) -> i32 {
    let q = v / d;
    if (v % d != 0) && ((v < 0) != (d < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder matching [`floor_div`]; always in `[0, d)` for positive `d`.
#[inline]
pub fn floor_mod(v: i32, d: i32) -> i32 {
    v - floor_div(v, d) * d
}

// ============================================================================
// Rect
// ============================================================================

/// A rectangle defined by two inclusive corner points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Clip this rectangle to the intersection with `r`.
    /// Returns `true` if the result is a valid (non-empty) rectangle.
    pub fn clip(&mut self, r: &Self) -> bool {
        if self.x2 > r.x2 {
            self.x2 = r.x2;
        }
        if self.y2 > r.y2 {
            self.y2 = r.y2;
        }
        if self.x1 < r.x1 {
            self.x1 = r.x1;
        }
        if self.y1 < r.y1 {
            self.y1 = r.y1;
        }
        self.is_valid()
    }

    /// Returns `true` if the rectangle is valid (non-empty).
    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Returns `true` if the point (x, y) is inside the rectangle.
    pub fn hit_test(&self, x: T, y: T) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Returns `true` if this rectangle overlaps with `r`.
    pub fn overlaps(&self, r: &Self) -> bool {
        !(r.x1 > self.x2 || r.x2 < self.x1 || r.y1 > self.y2 || r.y2 < self.y1)
    }

    /// Returns `true` if `r` lies entirely inside this rectangle.
    pub fn contains(&self, r: &Self) -> bool {
        r.x1 >= self.x1 && r.x2 <= self.x2 && r.y1 >= self.y1 && r.y2 <= self.y2
    }
}

/// Compute the intersection of two rectangles. The result may be invalid.
pub fn intersect_rectangles<T: Copy + PartialOrd>(r1: &Rect<T>, r2: &Rect<T>) -> Rect<T> {
    let mut r = *r1;
    r.clip(r2);
    r
}

/// Compute the union (bounding box) of two rectangles.
pub fn unite_rectangles<T: Copy + PartialOrd>(r1: &Rect<T>, r2: &Rect<T>) -> Rect<T> {
    let mut r = *r1;
    if r.x2 < r2.x2 {
        r.x2 = r2.x2;
    }
    if r.y2 < r2.y2 {
        r.y2 = r2.y2;
    }
    if r.x1 > r2.x1 {
        r.x1 = r2.x1;
    }
    if r.y1 > r2.y1 {
        r.y1 = r2.y1;
    }
    r
}

/// Rectangle with `i32` coordinates.
pub type RectI = Rect<i32>;

impl RectI {
    pub fn width(&self) -> i32 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1 + 1
    }

    /// Number of pixels covered, zero for an invalid rectangle.
    pub fn area(&self) -> u64 {
        if self.is_valid() {
            self.width() as u64 * self.height() as u64
        } else {
            0
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Translate by (-dx, -dy), or `None` if a corner leaves the `i32` range.
    pub fn checked_untranslated(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(
            self.x1.checked_sub(dx)?,
            self.y1.checked_sub(dy)?,
            self.x2.checked_sub(dx)?,
            self.y2.checked_sub(dy)?,
        ))
    }

    /// Translate by (dx, dy), clamping corners to the `i32` range.
    pub fn saturating_translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x1.saturating_add(dx),
            self.y1.saturating_add(dy),
            self.x2.saturating_add(dx),
            self.y2.saturating_add(dy),
        )
    }

    /// Grow the rectangle just enough to include the pixel (x, y).
    pub fn include_point(&mut self, x: i32, y: i32) {
        self.x1 = self.x1.min(x);
        self.y1 = self.y1.min(y);
        self.x2 = self.x2.max(x);
        self.y2 = self.y2.max(y);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_div_positive() {
        assert_eq!(floor_div(0, 64), 0);
        assert_eq!(floor_div(63, 64), 0);
        assert_eq!(floor_div(64, 64), 1);
        assert_eq!(floor_div(1000, 64), 15);
    }

    #[test]
    fn test_floor_div_negative() {
        assert_eq!(floor_div(-1, 64), -1);
        assert_eq!(floor_div(-10, 64), -1);
        assert_eq!(floor_div(-64, 64), -1);
        assert_eq!(floor_div(-65, 64), -2);
    }

    #[test]
    fn test_floor_mod_range() {
        assert_eq!(floor_mod(-1, 64), 63);
        assert_eq!(floor_mod(-64, 64), 0);
        assert_eq!(floor_mod(-10, 64), 54);
        assert_eq!(floor_mod(100, 64), 36);
    }

    #[test]
    fn test_rect_size() {
        let r = RectI::new(10, 20, 12, 23);
        assert_eq!(r, RectI::new(10, 20, 12, 23));
        assert_eq!(r.width(), 3);
        assert_eq!(r.height(), 4);
        assert_eq!(r.area(), 12);
    }

    #[test]
    fn test_rect_zero_size_is_invalid() {
        assert!(!RectI::new(0, 0, -1, 4).is_valid());
        assert!(!RectI::new(0, 0, 4, -2).is_valid());
        assert_eq!(RectI::new(0, 0, -1, 4).area(), 0);
    }

    #[test]
    fn test_rect_clip() {
        let mut r = RectI::new(0, 0, 100, 100);
        assert!(r.clip(&RectI::new(10, 20, 50, 60)));
        assert_eq!(r, RectI::new(10, 20, 50, 60));

        let mut r = RectI::new(0, 0, 10, 10);
        assert!(!r.clip(&RectI::new(20, 20, 30, 30)));
    }

    #[test]
    fn test_rect_hit_test_inclusive() {
        let r = RectI::new(10, 20, 50, 60);
        assert!(r.hit_test(10, 20));
        assert!(r.hit_test(50, 60));
        assert!(!r.hit_test(51, 60));
        assert!(!r.hit_test(9, 20));
    }

    #[test]
    fn test_rect_overlaps_and_contains() {
        let a = RectI::new(0, 0, 10, 10);
        assert!(a.overlaps(&RectI::new(10, 10, 20, 20)));
        assert!(!a.overlaps(&RectI::new(11, 0, 20, 10)));
        assert!(a.contains(&RectI::new(2, 2, 8, 8)));
        assert!(!a.contains(&RectI::new(2, 2, 11, 8)));
    }

    #[test]
    fn test_unite_and_intersect() {
        let a = RectI::new(-10, -10, 0, 0);
        let b = RectI::new(5, 5, 20, 20);
        assert_eq!(unite_rectangles(&a, &b), RectI::new(-10, -10, 20, 20));
        assert!(!intersect_rectangles(&a, &b).is_valid());
    }

    #[test]
    fn test_translation_at_limits() {
        let r = RectI::new(i32::MIN, 0, i32::MIN + 3, 0);
        assert_eq!(r.checked_untranslated(1, 0), None);
        assert_eq!(
            r.checked_untranslated(-1, 0),
            Some(RectI::new(i32::MIN + 1, 0, i32::MIN + 4, 0))
        );
        // 0 - i32::MIN does not fit.
        assert_eq!(r.checked_untranslated(0, i32::MIN), None);
        let far = RectI::new(i32::MAX - 63, 0, i32::MAX, 63);
        assert_eq!(
            far.saturating_translated(10, 0),
            RectI::new(i32::MAX - 53, 0, i32::MAX, 63)
        );
    }

    #[test]
    fn test_include_point() {
        let mut r = RectI::new(5, 5, 5, 5);
        r.include_point(-3, 8);
        assert_eq!(r, RectI::new(-3, 5, 5, 8));
    }
}
