//! Sketch canvas for new input
//!
//! Cell coordinates use `Point` with `x` as column and `y` as row. Painting
//! outside the grid is clipped silently.

use crate::shared::{PixelGrid, Point, Size};

/// Largest brush radius in cells
pub const MAX_BRUSH_RADIUS: u32 = 255;
/// Largest canvas side in cells
pub const MAX_CANVAS_SIDE: u32 = 4096;

pub struct Canvas {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            cells: vec![0; size.width as usize * size.height as usize],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Number of set cells
    pub fn ink(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    fn index(&self, cell: Point) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x as u32 >= self.width || cell.y as u32 >= self.height {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Set every cell within `radius` of `center`
    #[cfg(test)]
    pub fn dab(&mut self, center: Point, radius: u32) {
        self.dab_at(i64::from(center.x), i64::from(center.y), radius);
    }

    fn dab_at(&mut self, cx: i64, cy: i64, radius: u32) {
        let r = i64::from(radius.min(MAX_BRUSH_RADIUS));
        let (width, height) = (i64::from(self.width), i64::from(self.height));

        // Only the part of the brush square that overlaps the grid is visited.
        let cols = (cx - r).max(0)..=(cx + r).min(width - 1);
        for y in (cy - r).max(0)..=(cy + r).min(height - 1) {
            for x in cols.clone() {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.cells[(y * width + x) as usize] = 1;
                }
            }
        }
    }

    /// Dab along the segment `from`-`to` so fast strokes leave no gaps
    ///
    /// The radius is capped at [`MAX_BRUSH_RADIUS`].
    pub fn stroke(&mut self, from: Point, to: Point, radius: u32) {
        let (mut x, mut y) = (i64::from(from.x), i64::from(from.y));
        let (x1, y1) = (i64::from(to.x), i64::from(to.y));
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.dab_at(x, y, radius);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

impl PixelGrid for Canvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, row: u32, col: u32) -> Option<u8> {
        let i = self.index(Point::new(col as i32, row as i32))?;
        Some(self.cells[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canvas_is_blank() {
        let canvas = Canvas::new(Size::new(4, 3));
        assert_eq!(canvas.ink(), 0);
        assert_eq!(canvas.pixel(2, 3), Some(0));
        assert_eq!(canvas.pixel(3, 0), None);
        assert_eq!(canvas.pixel(0, 4), None);
    }

    #[test]
    fn test_dab_radius_zero_sets_one_cell() {
        let mut canvas = Canvas::new(Size::new(5, 5));
        canvas.dab(Point::new(2, 1), 0);
        assert_eq!(canvas.ink(), 1);
        assert_eq!(canvas.pixel(1, 2), Some(1));
    }

    #[test]
    fn test_dab_is_round_and_clipped() {
        let mut canvas = Canvas::new(Size::new(10, 10));
        canvas.dab(Point::new(5, 5), 1);
        assert_eq!(canvas.ink(), 5);
        assert_eq!(canvas.pixel(4, 4), Some(0));

        let mut corner = Canvas::new(Size::new(10, 10));
        corner.dab(Point::new(0, 0), 1);
        assert_eq!(corner.ink(), 3);

        let mut outside = Canvas::new(Size::new(10, 10));
        outside.dab(Point::new(-5, 50), 2);
        assert_eq!(outside.ink(), 0);
    }

    #[test]
    fn test_stroke_has_no_gaps() {
        let mut canvas = Canvas::new(Size::new(20, 20));
        canvas.stroke(Point::new(0, 0), Point::new(19, 0), 0);
        assert_eq!(canvas.ink(), 20);

        let mut diagonal = Canvas::new(Size::new(20, 20));
        diagonal.stroke(Point::new(19, 19), Point::new(0, 0), 0);
        for i in 0..20 {
            assert_eq!(diagonal.pixel(i, i), Some(1));
        }
    }

    #[test]
    fn test_stroke_entering_from_outside() {
        let mut canvas = Canvas::new(Size::new(10, 10));
        canvas.stroke(Point::new(-10, 5), Point::new(3, 5), 0);
        assert_eq!(canvas.ink(), 4);
    }

    #[test]
    fn test_huge_radius_is_capped() {
        let mut canvas = Canvas::new(Size::new(600, 600));
        canvas.dab(Point::new(0, 0), 50_000);
        assert_eq!(canvas.pixel(0, MAX_BRUSH_RADIUS), Some(1));
        assert_eq!(canvas.pixel(0, MAX_BRUSH_RADIUS + 1), Some(0));

        let mut extreme = Canvas::new(Size::new(10, 10));
        extreme.dab(Point::new(i32::MAX, i32::MIN), u32::MAX);
        extreme.stroke(Point::new(i32::MIN, 0), Point::new(i32::MIN + 3, 0), u32::MAX);
        assert_eq!(extreme.ink(), 0);
    }

    #[test]
    fn test_clear() {
        let mut canvas = Canvas::new(Size::new(10, 10));
        canvas.dab(Point::new(5, 5), 3);
        assert!(canvas.ink() > 0);
        canvas.clear();
        assert_eq!(canvas.ink(), 0);
    }
}
