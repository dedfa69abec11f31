//! Backend that records draw calls instead of drawing

use std::collections::HashMap;

use anyhow::{bail, Result};

use super::{Backend, Color, InputSnapshot, SurfaceId};
use crate::shared::{Point, Rect, Size};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    BeginFrame,
    EndFrame,
    BeginSurface(SurfaceId),
    EndSurface,
    FillRect {
        target: Option<SurfaceId>,
        rect: Rect,
        color: Color,
    },
    Text {
        target: Option<SurfaceId>,
        origin: Point,
        text: String,
        color: Color,
    },
    Blit {
        surface: SurfaceId,
        dest: Point,
    },
}

pub struct RecordingBackend {
    screen: Size,
    next_id: u32,
    surfaces: HashMap<SurfaceId, Size>,
    active: Option<SurfaceId>,
    calls: Vec<DrawCall>,
    /// Input handed out on the next `begin_frame`
    pending_input: InputSnapshot,
    input: InputSnapshot,
    close_requested: bool,
    fail_blits: bool,
    fail_destroys: bool,
}

impl RecordingBackend {
    pub fn new(screen: Size) -> Self {
        Self {
            screen,
            next_id: 1,
            surfaces: HashMap::new(),
            active: None,
            calls: Vec::new(),
            pending_input: InputSnapshot::default(),
            input: InputSnapshot::default(),
            close_requested: false,
            fail_blits: false,
            fail_destroys: false,
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn active_surface(&self) -> Option<SurfaceId> {
        self.active
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    pub fn surface_size(&self, surface: SurfaceId) -> Option<Size> {
        self.surfaces.get(&surface).copied()
    }

    pub fn set_input(&mut self, input: InputSnapshot) {
        self.pending_input = input;
    }

    /// Make every later `blit_surface` fail
    pub fn fail_blits(&mut self) {
        self.fail_blits = true;
    }

    /// Make every later `destroy_surface` fail
    pub fn fail_destroys(&mut self) {
        self.fail_destroys = true;
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Surfaces in the order they were blitted
    pub fn blit_order(&self) -> Vec<SurfaceId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Blit { surface, .. } => Some(*surface),
                _ => None,
            })
            .collect()
    }
}

impl Backend for RecordingBackend {
    fn screen_size(&self) -> Size {
        self.screen
    }

    fn create_surface(&mut self, size: Size) -> Result<SurfaceId> {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, size);
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) -> Result<()> {
        if self.fail_destroys {
            bail!("destroy of {:?} refused", surface);
        }
        if self.surfaces.remove(&surface).is_none() {
            bail!("unknown surface {:?}", surface);
        }
        Ok(())
    }

    fn begin_surface(&mut self, surface: SurfaceId) -> Result<()> {
        if !self.surfaces.contains_key(&surface) {
            bail!("unknown surface {:?}", surface);
        }
        if self.active.is_some() {
            bail!("surface capture already active");
        }
        self.active = Some(surface);
        self.calls.push(DrawCall::BeginSurface(surface));
        Ok(())
    }

    fn end_surface(&mut self) -> Result<()> {
        self.active = None;
        self.calls.push(DrawCall::EndSurface);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.calls.push(DrawCall::FillRect {
            target: self.active,
            rect,
            color,
        });
        Ok(())
    }

    fn draw_text(&mut self, origin: Point, _size: u32, text: &str, color: Color) -> Result<()> {
        self.calls.push(DrawCall::Text {
            target: self.active,
            origin,
            text: text.to_string(),
            color,
        });
        Ok(())
    }

    fn blit_surface(&mut self, surface: SurfaceId, _src: Rect, dest: Point) -> Result<()> {
        if self.active.is_some() {
            bail!("blit while a surface capture is active");
        }
        if self.fail_blits {
            bail!("blit of {:?} refused", surface);
        }
        self.calls.push(DrawCall::Blit { surface, dest });
        Ok(())
    }

    fn begin_frame(&mut self, _clear: Color) -> Result<()> {
        self.input = std::mem::take(&mut self.pending_input);
        // Held buttons and the pointer persist between frames; edges do not.
        self.pending_input.pointer = self.input.pointer;
        self.pending_input.down = self.input.down;
        self.calls.push(DrawCall::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push(DrawCall::EndFrame);
        Ok(())
    }

    fn input(&self) -> InputSnapshot {
        self.input
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }
}
