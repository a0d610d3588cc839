//! Screen geometry: integer rectangles, float sprite rectangles and points.

/// Axis-aligned integer rectangle (`LCDRect`).
///
/// `right` and `bottom` are exclusive. Callers keep `right >= left` and
/// `bottom >= top`; nothing here validates it. Arithmetic wraps like the
/// firmware's 32-bit ints.
///
/// # Example
///
/// ```
/// use playdate_core::Rect;
///
/// let r = Rect::new(10, 20, 30, 40).translate(5, -5);
/// assert_eq!(r, Rect { left: 15, right: 45, top: 15, bottom: 55 });
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub left: i32,
    /// Exclusive.
    pub right: i32,
    pub top: i32,
    /// Exclusive.
    pub bottom: i32,
}

impl Rect {
    /// Build a rect from its origin and size (`LCDMakeRect`).
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            left: x,
            right: x.wrapping_add(width),
            top: y,
            bottom: y.wrapping_add(height),
        }
    }

    /// Shift all four edges (`LCDRect_translate`).
    #[inline]
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.wrapping_add(dx),
            right: self.right.wrapping_add(dx),
            top: self.top.wrapping_add(dy),
            bottom: self.bottom.wrapping_add(dy),
        }
    }

    #[inline]
    #[must_use]
    pub const fn x(self) -> i32 {
        self.left
    }

    #[inline]
    #[must_use]
    pub const fn y(self) -> i32 {
        self.top
    }

    #[inline]
    #[must_use]
    pub const fn width(self) -> i32 {
        self.right.wrapping_sub(self.left)
    }

    #[inline]
    #[must_use]
    pub const fn height(self) -> i32 {
        self.bottom.wrapping_sub(self.top)
    }
}

/// Free-function form of [`Rect::new`].
#[inline]
#[must_use]
pub const fn make_rect(x: i32, y: i32, width: i32, height: i32) -> Rect {
    Rect::new(x, y, width, height)
}

/// Float rectangle used by the sprite API (`PDRect`).
#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PdRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PdRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Float point (`CollisionPoint`).
#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer direction (`CollisionVector`), each axis in -1..=1.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_rect_edges() {
        for &(x, y, w, h) in &[(0, 0, 0, 0), (10, 20, 30, 40), (-5, -7, 3, 1)] {
            let r = make_rect(x, y, w, h);
            assert_eq!(r.left, x);
            assert_eq!(r.top, y);
            assert_eq!(r.right - r.left, w);
            assert_eq!(r.bottom - r.top, h);
            assert_eq!(r.width(), w);
            assert_eq!(r.height(), h);
        }
    }

    #[test]
    fn test_translate_identity() {
        let r = Rect::new(3, 4, 5, 6);
        assert_eq!(r.translate(0, 0), r);
    }

    #[test]
    fn test_translate_is_additive() {
        let r = Rect::new(-10, 25, 100, 12);
        let stepwise = r.translate(7, -3).translate(-20, 9);
        assert_eq!(stepwise, r.translate(7 - 20, -3 + 9));
    }

    #[test]
    fn test_translate_does_not_touch_input() {
        let r = Rect::new(1, 2, 3, 4);
        let moved = r.translate(10, 10);
        assert_eq!(r, Rect::new(1, 2, 3, 4));
        assert_eq!(moved, Rect::new(11, 12, 3, 4));
    }

    #[test]
    fn test_wraps_like_c_ints() {
        let r = Rect::new(i32::MAX, 0, 1, 0);
        assert_eq!(r.right, i32::MIN);
        assert_eq!(r.translate(1, 0).left, i32::MIN);
    }
}
