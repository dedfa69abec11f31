//! Rendering backend
//!
//! The window manager never talks to a display server directly. It drives a
//! [`Backend`], an immediate-mode collaborator that can draw rectangles and
//! text, render into off-screen surfaces and blit those surfaces onto the
//! screen. The shipped backend is [`x11::X11Backend`]; tests use a
//! recording backend.

pub mod x11;

#[cfg(test)]
pub mod recording;

use anyhow::Result;

use crate::shared::{Point, Rect, Size};

/// Opaque handle to an off-screen surface owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// 24-bit colour, 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    /// Per-channel blend `num / den` of the way from `self` to `other`
    ///
    /// `num` is clamped to `den`; a zero `den` gives `other`.
    pub fn lerp(self, other: Color, num: u32, den: u32) -> Color {
        if den == 0 || num >= den {
            return other;
        }
        let channel = |shift: u32| {
            let from = (self.0 >> shift) & 0xff;
            let to = (other.0 >> shift) & 0xff;
            let mixed = (from * (den - num) + to * num) / den;
            mixed << shift
        };
        Color(channel(16) | channel(8) | channel(0))
    }
}

/// Mouse buttons the application reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 1 << 0,
            MouseButton::Middle => 1 << 1,
            MouseButton::Right => 1 << 2,
        }
    }
}

/// Small bitset of mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub fn contains(self, button: MouseButton) -> bool {
        self.0 & button.bit() != 0
    }

    pub fn insert(&mut self, button: MouseButton) {
        self.0 |= button.bit();
    }

    pub fn remove(&mut self, button: MouseButton) {
        self.0 &= !button.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Pointer state for one frame
///
/// `pressed` and `released` hold the edges seen since the previous frame, so a
/// click shorter than a frame is still observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    pub pointer: Point,
    pub down: ButtonSet,
    pub pressed: ButtonSet,
    pub released: ButtonSet,
    /// Wheel steps since the previous frame; positive is away from the user
    pub wheel: i32,
}

impl InputSnapshot {
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.down.contains(button)
    }

    pub fn was_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains(button)
    }

    pub fn was_released(&self, button: MouseButton) -> bool {
        self.released.contains(button)
    }
}

/// Immediate-mode drawing collaborator
///
/// Drawing calls land on the active surface between [`Backend::begin_surface`]
/// and [`Backend::end_surface`], and on the screen otherwise.
pub trait Backend {
    /// Current drawable screen size
    fn screen_size(&self) -> Size;

    fn create_surface(&mut self, size: Size) -> Result<SurfaceId>;

    fn destroy_surface(&mut self, surface: SurfaceId) -> Result<()>;

    /// Redirect subsequent drawing into `surface`
    fn begin_surface(&mut self, surface: SurfaceId) -> Result<()>;

    /// Restore the screen as the drawing target
    fn end_surface(&mut self) -> Result<()>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    /// Draw `text` with its top-left corner at `origin`, roughly `size` pixels tall
    fn draw_text(&mut self, origin: Point, size: u32, text: &str, color: Color) -> Result<()>;

    /// Copy `src` of `surface` to the screen at `dest`
    fn blit_surface(&mut self, surface: SurfaceId, src: Rect, dest: Point) -> Result<()>;

    /// Process pending input and clear the screen
    fn begin_frame(&mut self, clear: Color) -> Result<()>;

    /// Present the frame
    fn end_frame(&mut self) -> Result<()>;

    /// Input gathered by the last [`Backend::begin_frame`]
    fn input(&self) -> InputSnapshot;

    /// True once the user asked to close the application window
    fn should_close(&self) -> bool;
}

/// Active render target scope
///
/// Created by [`crate::wm::window::Window::begin_surface`]. Drawing goes
/// through the scope; the backend's target is restored by [`SurfaceScope::end`]
/// or, on early exit, when the scope is dropped.
pub struct SurfaceScope<'a, B: Backend + ?Sized> {
    backend: &'a mut B,
    active: bool,
}

impl<'a, B: Backend + ?Sized> SurfaceScope<'a, B> {
    pub fn begin(backend: &'a mut B, surface: SurfaceId) -> Result<Self> {
        backend.begin_surface(surface)?;
        Ok(Self {
            backend,
            active: true,
        })
    }

    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    /// End the scope, reporting any error from the backend
    pub fn end(mut self) -> Result<()> {
        self.active = false;
        self.backend.end_surface()
    }
}

impl<B: Backend + ?Sized> Drop for SurfaceScope<'_, B> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.backend.end_surface() {
                tracing::warn!("Failed to restore render target: {}", e);
            }
        }
    }
}
