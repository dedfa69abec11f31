//! MoveResize Module
//!
//! Interactive window moving. The grab offset is fixed for the whole
//! gesture; the pointer is clamped to the screen before it is applied, so
//! the grab point never leaves the screen while the corner may.

use crate::shared::{Point, Size};
use crate::wm::stacking::WindowId;

/// An active move gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveState {
    /// Window being moved
    pub window: WindowId,
    /// Grab point minus window corner at gesture start
    pub offset: Point,
}

impl MoveState {
    pub fn start(window: WindowId, pointer: Point, corner: Point) -> Self {
        Self {
            window,
            offset: pointer - corner,
        }
    }

    /// Window corner for the current pointer position
    pub fn corner_for(&self, pointer: Point, screen: Size) -> Point {
        pointer.clamp_to(screen) - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_grab_minus_corner() {
        let state = MoveState::start(WindowId(0), Point::new(60, 70), Point::new(10, 40));
        assert_eq!(state.offset, Point::new(50, 30));
        assert_eq!(
            state.corner_for(Point::new(100, 100), Size::new(800, 600)),
            Point::new(50, 70)
        );
    }

    #[test]
    fn test_pointer_is_clamped_before_offset() {
        let state = MoveState::start(WindowId(0), Point::new(60, 70), Point::new(10, 40));
        let screen = Size::new(800, 600);
        assert_eq!(state.corner_for(Point::new(-30, -30), screen), Point::new(-50, -30));
        assert_eq!(state.corner_for(Point::new(5000, 5000), screen), Point::new(750, 570));
    }
}
