//! Window Manager Module
//!
//! Stacking, hover, drag-to-move and the per-frame render and composite
//! passes for digit-board windows.

pub mod decorations;
pub mod focus;
pub mod moveresize;
pub mod stacking;
pub mod window;

use anyhow::Result;
use tracing::{debug, trace};

use crate::render::{Backend, InputSnapshot, MouseButton};
use crate::shared::{Point, Rect, Size};
use decorations::ChromePalette;
use moveresize::MoveState;
pub use stacking::{WindowId, WindowStack};
pub use window::Window;

/// Button that grabs a window for moving
pub const DRAG_BUTTON: MouseButton = MouseButton::Right;

/// What changed during one [`Interaction::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEvents {
    /// Window that became hovered (and was promoted) this frame
    pub hover_started: Option<WindowId>,
    pub drag_started: bool,
    pub drag_ended: bool,
}

/// Hover and drag state carried from frame to frame
///
/// Hover is re-resolved every frame unless a drag keeps it alive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interaction {
    hovered: Option<WindowId>,
    /// Stack index the hovered window had when hover began
    hover_index: usize,
    drag: Option<MoveState>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<WindowId> {
        self.hovered
    }

    #[cfg(test)]
    pub fn hover_index(&self) -> usize {
        self.hover_index
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[cfg(test)]
    pub fn drag(&self) -> Option<&MoveState> {
        self.drag.as_ref()
    }

    /// Resolve hover, promote, and advance the drag gesture for one frame
    pub fn update(
        &mut self,
        stack: &mut WindowStack,
        windows: &mut WindowTable,
        input: &InputSnapshot,
        screen: Size,
    ) -> FrameEvents {
        let mut events = FrameEvents::default();

        if self.hovered.is_none() {
            let table: &WindowTable = windows;
            if let Some((index, id)) = focus::window_at(stack, |id| table.get(id), input.pointer) {
                self.hovered = Some(id);
                self.hover_index = index;
                events.hover_started = Some(id);
                trace!("Hover began on {:?} at stack index {}", id, index);
            }
        }

        if events.hover_started.is_some() {
            stack.move_to_front(self.hover_index);
        }

        let Some(hovered) = self.hovered else {
            return events;
        };

        if self.drag.is_none() && input.was_pressed(DRAG_BUTTON) {
            if let Some(window) = windows.get(hovered) {
                let state = MoveState::start(hovered, input.pointer, window.corner);
                debug!("Drag started on {:?} with offset {:?}", hovered, state.offset);
                self.drag = Some(state);
                events.drag_started = true;
            }
        }

        let Some(drag) = self.drag else {
            return events;
        };
        let Some(window) = windows.get_mut(drag.window) else {
            self.hovered = None;
            self.drag = None;
            return events;
        };

        window.corner = drag.corner_for(input.pointer, screen);
        trace!("Dragged {:?} to {:?}", drag.window, window.corner);

        if input.was_released(DRAG_BUTTON) {
            debug!("Drag ended on {:?} at {:?}", drag.window, window.corner);
            self.drag = None;
            events.drag_ended = true;
        }

        events
    }

    /// End-of-frame hover reset; hover only survives frames through a drag
    pub fn finish_frame(&mut self) {
        if self.hovered.is_some() && self.drag.is_none() {
            self.hovered = None;
        }
    }
}

/// Windows by id; ids are slot indices and stay stable
#[derive(Debug, Default)]
pub struct WindowTable {
    slots: Vec<Option<Window>>,
}

impl WindowTable {
    pub fn insert(&mut self, window: Window) -> WindowId {
        self.slots.push(Some(window));
        WindowId(self.slots.len() - 1)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn drain(&mut self) -> impl Iterator<Item = Window> + '_ {
        self.slots.drain(..).flatten()
    }
}

/// The set of windows on screen and their interaction state
pub struct Desktop {
    windows: WindowTable,
    stack: WindowStack,
    interaction: Interaction,
    chrome: ChromePalette,
}

impl Desktop {
    pub fn new(chrome: ChromePalette) -> Self {
        Self {
            windows: WindowTable::default(),
            stack: WindowStack::new(),
            interaction: Interaction::new(),
            chrome,
        }
    }

    /// Add a window behind all existing windows
    pub fn add_window(&mut self, window: Window) -> WindowId {
        let id = self.windows.insert(window);
        self.stack.push_back(id);
        debug!("Added window {:?}, stack depth {}", id, self.stack.len());
        id
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    #[cfg(test)]
    pub fn stack(&self) -> &WindowStack {
        &self.stack
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn hovered(&self) -> Option<WindowId> {
        self.interaction.hovered()
    }

    pub fn chrome(&self) -> &ChromePalette {
        &self.chrome
    }

    /// Hover, promotion and drag for this frame
    pub fn update(&mut self, input: &InputSnapshot, screen: Size) -> FrameEvents {
        self.interaction
            .update(&mut self.stack, &mut self.windows, input, screen)
    }

    /// Draw every window into its own surface, in stack order
    ///
    /// `draw_content` is called with the window's surface active and its
    /// draw cursor reset to the content origin.
    pub fn render<B, F>(&mut self, backend: &mut B, mut draw_content: F) -> Result<()>
    where
        B: Backend + ?Sized,
        F: FnMut(WindowId, &Window, &mut B, bool) -> Result<()>,
    {
        let hovered = self.interaction.hovered();
        for id in self.stack.front_to_back() {
            let Some(window) = self.windows.get_mut(id) else {
                continue;
            };
            window.reset_draw_cursor();

            let highlighted = hovered == Some(id);
            let mut scope = window.begin_surface(backend)?;
            window.draw_chrome(scope.backend(), &self.chrome, highlighted)?;
            draw_content(id, window, scope.backend(), highlighted)?;
            scope.end()?;
        }
        Ok(())
    }

    /// Blit surfaces back to front so the front window ends up on top
    pub fn composite<B: Backend + ?Sized>(&self, backend: &mut B) -> Result<()> {
        for id in self.stack.back_to_front() {
            let Some(window) = self.windows.get(id) else {
                continue;
            };
            backend.blit_surface(
                window.surface(),
                Rect::from_parts(Point::default(), window.size()),
                window.corner,
            )?;
        }
        Ok(())
    }

    pub fn finish_frame(&mut self) {
        self.interaction.finish_frame();
    }

    /// Release every window surface
    pub fn destroy<B: Backend + ?Sized>(mut self, backend: &mut B) -> Result<()> {
        let mut first_error = None;
        for window in self.windows.drain() {
            if let Err(e) = window.destroy(backend) {
                tracing::warn!("Failed to release window surface: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
