//! Integer screen geometry
//!
//! Screen coordinates are signed because windows may be dragged partly off
//! screen; sizes are unsigned and fixed once a window exists.

/// A point in screen (or surface-local) pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into `[0, bounds.width] x [0, bounds.height]`
    pub fn clamp_to(self, bounds: Size) -> Self {
        Self {
            x: self.x.clamp(0, bounds.width as i32),
            y: self.y.clamp(0, bounds.height as i32),
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Inclusive hit test: points on the right and bottom edges count as inside.
    pub fn contains_inclusive(&self, point: Point) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && px <= x + i64::from(self.width) && py >= y && py <= y + i64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_screen() {
        let screen = Size::new(800, 600);
        assert_eq!(Point::new(-5, 700).clamp_to(screen), Point::new(0, 600));
        assert_eq!(Point::new(800, 0).clamp_to(screen), Point::new(800, 0));
        assert_eq!(Point::new(10, 20).clamp_to(screen), Point::new(10, 20));
    }

    #[test]
    fn test_inclusive_edges() {
        let rect = Rect::new(10, 10, 100, 50);
        assert!(rect.contains_inclusive(Point::new(10, 10)));
        assert!(rect.contains_inclusive(Point::new(110, 60)));
        assert!(!rect.contains_inclusive(Point::new(111, 60)));
        assert!(!rect.contains_inclusive(Point::new(9, 30)));

        let far = Rect::new(i32::MAX - 5, 0, u32::MAX, 10);
        assert!(far.contains_inclusive(Point::new(i32::MAX, 10)));
    }

    #[test]
    fn test_point_arithmetic_saturates() {
        assert_eq!(Point::new(i32::MIN, 0) - Point::new(1, 0), Point::new(i32::MIN, 0));
        assert_eq!(Point::new(i32::MAX, 1) + Point::new(1, 1), Point::new(i32::MAX, 2));
    }
}
