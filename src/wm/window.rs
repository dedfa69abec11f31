//! A titled, draggable panel that renders into its own surface

use anyhow::{Context, Result};
use tracing::debug;

use crate::render::{Backend, SurfaceId, SurfaceScope};
use crate::shared::{PixelGrid, Point, Rect, Size};
use crate::wm::decorations::{self, ChromePalette, PixelPalette};

/// One on-screen panel
///
/// Size and surface are fixed at creation; only the corner moves.
#[derive(Debug)]
pub struct Window {
    pub title: String,
    /// Top-left corner in screen coordinates
    pub corner: Point,
    size: Size,
    border: u32,
    surface: SurfaceId,
    /// Surface-local origin for content drawing
    cursor: Point,
}

impl Window {
    /// Create a window around a content region and allocate its surface
    pub fn new<B: Backend + ?Sized>(
        backend: &mut B,
        title: impl Into<String>,
        corner: Point,
        content: Size,
        border: u32,
    ) -> Result<Self> {
        let title = title.into();
        let size = Self::compute_size(content, border).with_context(|| {
            format!(
                "Window {:?} is too large: {}x{} content with border {}",
                title, content.width, content.height, border
            )
        })?;
        let surface = backend.create_surface(size)?;

        debug!(
            "Created window {:?} at ({}, {}) size {}x{}",
            title, corner.x, corner.y, size.width, size.height
        );

        let mut window = Self {
            title,
            corner,
            size,
            border,
            surface,
            cursor: Point::default(),
        };
        window.reset_draw_cursor();
        Ok(window)
    }

    /// Outer size for a content region: a border on every side plus a
    /// border-high title bar. `None` if it does not fit screen coordinates.
    pub fn compute_size(content: Size, border: u32) -> Option<Size> {
        let width = border.checked_mul(2)?.checked_add(content.width)?;
        let height = border.checked_mul(3)?.checked_add(content.height)?;
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return None;
        }
        Some(Size::new(width, height))
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// Screen-space bounds
    pub fn bounds(&self) -> Rect {
        Rect::from_parts(self.corner, self.size)
    }

    /// Move the draw cursor to the top-left of the content area
    pub fn reset_draw_cursor(&mut self) {
        self.cursor = Point::new(self.border as i32, 2 * self.border as i32);
    }

    /// Inclusive on all four edges
    pub fn contains_point(&self, point: Point) -> bool {
        self.bounds().contains_inclusive(point)
    }

    /// Make this window's surface the render target until the scope ends
    pub fn begin_surface<'b, B: Backend + ?Sized>(
        &self,
        backend: &'b mut B,
    ) -> Result<SurfaceScope<'b, B>> {
        SurfaceScope::begin(backend, self.surface)
    }

    /// Background and title
    pub fn draw_chrome<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        palette: &ChromePalette,
        highlighted: bool,
    ) -> Result<()> {
        backend.fill_rect(
            Rect::from_parts(Point::default(), self.size),
            palette.background(highlighted),
        )?;
        backend.draw_text(
            Point::new(self.border as i32, decorations::title_inset_y(self.border)),
            decorations::title_text_size(self.border),
            &self.title,
            palette.title(highlighted),
        )
    }

    /// Secondary text in the right half of the title bar
    pub fn draw_caption<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        palette: &ChromePalette,
        highlighted: bool,
        text: &str,
    ) -> Result<()> {
        backend.draw_text(
            Point::new((self.size.width / 2) as i32, decorations::title_inset_y(self.border)),
            decorations::title_text_size(self.border),
            text,
            palette.title(highlighted),
        )
    }

    /// Draw a pixel grid at the draw cursor, `pixel_size` pixels per cell
    ///
    /// The grid area is filled with paper first. Runs of equal non-zero
    /// intensity in a row are drawn as one rectangle, shaded from paper
    /// towards ink by intensity.
    pub fn draw_pixels<B: Backend + ?Sized, G: PixelGrid + ?Sized>(
        &self,
        backend: &mut B,
        grid: &G,
        pixel_size: u32,
        palette: &PixelPalette,
    ) -> Result<()> {
        let cell = pixel_size.max(1);
        let max = grid.max_intensity();
        backend.fill_rect(
            Rect::new(
                self.cursor.x,
                self.cursor.y,
                grid.width().saturating_mul(cell),
                grid.height().saturating_mul(cell),
            ),
            palette.paper,
        )?;

        for row in 0..grid.height() {
            let mut col = 0;
            while col < grid.width() {
                let value = grid.pixel(row, col).unwrap_or(0);
                if value == 0 {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < grid.width() && grid.pixel(row, col).unwrap_or(0) == value {
                    col += 1;
                }
                backend.fill_rect(
                    Rect::new(
                        self.cursor.x.saturating_add((start * cell) as i32),
                        self.cursor.y.saturating_add((row * cell) as i32),
                        (col - start) * cell,
                        cell,
                    ),
                    palette.shade(value, max),
                )?;
            }
        }
        Ok(())
    }

    /// Content cell under a screen point, in cell units of `pixel_size`
    ///
    /// Not bounds-checked: points left of or above the content area give
    /// negative cells.
    pub fn content_cell(&self, point: Point, pixel_size: u32) -> Point {
        let cell = pixel_size.max(1) as i32;
        let local = point - self.corner - Point::new(self.border as i32, 2 * self.border as i32);
        Point::new(local.x.div_euclid(cell), local.y.div_euclid(cell))
    }

    /// Release the surface
    pub fn destroy<B: Backend + ?Sized>(self, backend: &mut B) -> Result<()> {
        debug!("Destroying window {:?}", self.title);
        backend.destroy_surface(self.surface)
    }
}
