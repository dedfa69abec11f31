//! Geometry and pixel access shared between the window manager, the dataset
//! and the canvas.

pub mod geometry;
pub mod pixels;

pub use geometry::{Point, Rect, Size};
pub use pixels::PixelGrid;
