//! Focus Module
//!
//! Hover resolution. At most one window is hovered at a time; when windows
//! overlap, the one nearest the front of the stack wins.

use crate::shared::Point;
use crate::wm::stacking::{WindowId, WindowStack};
use crate::wm::window::Window;

/// Frontmost window containing `point`, with its stack index
pub fn window_at<'w>(
    stack: &WindowStack,
    lookup: impl Fn(WindowId) -> Option<&'w Window>,
    point: Point,
) -> Option<(usize, WindowId)> {
    stack
        .front_to_back()
        .enumerate()
        .find(|&(_, id)| lookup(id).is_some_and(|w| w.contains_point(point)))
}
