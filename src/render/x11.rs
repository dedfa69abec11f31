//! X11 rendering backend
//!
//! Surfaces are server-side pixmaps. Screen drawing goes into a back-buffer
//! pixmap that is copied onto the application window at the end of every
//! frame, so compositing never flickers.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{Backend, Color, InputSnapshot, MouseButton, SurfaceId};
use crate::shared::{Point, Rect, Size};

/// Longest string a single PolyText8 item can carry
const MAX_TEXT_ITEM: usize = 254;

const BUTTON_LEFT: u8 = 1;
const BUTTON_MIDDLE: u8 = 2;
const BUTTON_RIGHT: u8 = 3;
const WHEEL_UP: u8 = 4;
const WHEEL_DOWN: u8 = 5;

/// Pointer position reported while the pointer is outside the window
const POINTER_AWAY: Point = Point::new(i32::MIN, i32::MIN);

struct Surface {
    pixmap: Pixmap,
    size: Size,
}

struct LoadedFont {
    id: Font,
    ascent: i16,
}

/// Atoms needed to cooperate with the window manager
struct Atoms {
    wm_protocols: Atom,
    wm_delete_window: Atom,
}

impl Atoms {
    fn intern(conn: &RustConnection) -> Result<Self> {
        let intern = |name: &[u8]| -> Result<Atom> {
            Ok(conn
                .intern_atom(false, name)?
                .reply()
                .with_context(|| format!("Failed to intern {}", String::from_utf8_lossy(name)))?
                .atom)
        };

        Ok(Self {
            wm_protocols: intern(b"WM_PROTOCOLS")?,
            wm_delete_window: intern(b"WM_DELETE_WINDOW")?,
        })
    }
}

pub struct X11Backend {
    conn: RustConnection,
    window: Window,
    depth: u8,
    gc: Gcontext,
    atoms: Atoms,
    back_buffer: Pixmap,
    screen: Size,
    surfaces: HashMap<SurfaceId, Surface>,
    next_surface: u32,
    active: Option<SurfaceId>,
    fonts: HashMap<u32, LoadedFont>,
    current_font: Option<Font>,
    input: InputSnapshot,
    pending: InputSnapshot,
    close_requested: bool,
}

impl X11Backend {
    /// Connect to the X server and map a top-level window of `size`
    pub fn open(title: &str, size: Size) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let depth = screen.root_depth;

        info!("Connected to X server, screen {}, root window {}", screen_num, root);
        if depth < 24 {
            warn!("Root depth is {}, colours assume a 24-bit TrueColor visual", depth);
        }

        let width = to_u16(size.width).max(1);
        let height = to_u16(size.height).max(1);

        let window = conn.generate_id()?;
        conn.create_window(
            depth,
            window,
            root,
            0,
            0,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(screen.black_pixel)
                .event_mask(
                    EventMask::EXPOSURE
                        | EventMask::STRUCTURE_NOTIFY
                        | EventMask::BUTTON_PRESS
                        | EventMask::BUTTON_RELEASE
                        | EventMask::POINTER_MOTION
                        | EventMask::ENTER_WINDOW
                        | EventMask::LEAVE_WINDOW,
                ),
        )?;

        let atoms = Atoms::intern(&conn)?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.wm_protocols,
            AtomEnum::ATOM,
            &[atoms.wm_delete_window],
        )?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, window, &CreateGCAux::new().foreground(screen.white_pixel))?;

        let back_buffer = conn.generate_id()?;
        conn.create_pixmap(depth, back_buffer, window, width, height)?
            .check()
            .context("Failed to create back buffer")?;

        conn.map_window(window)?;
        conn.flush()?;

        info!("Opened {}x{} window {} ({:?})", width, height, window, title);

        Ok(Self {
            conn,
            window,
            depth,
            gc,
            atoms,
            back_buffer,
            screen: Size::new(width as u32, height as u32),
            surfaces: HashMap::new(),
            next_surface: 1,
            active: None,
            fonts: HashMap::new(),
            current_font: None,
            input: InputSnapshot::default(),
            pending: InputSnapshot::default(),
            close_requested: false,
        })
    }

    /// Drawable that receives drawing calls right now
    fn target(&self) -> Drawable {
        self.active
            .and_then(|id| self.surfaces.get(&id))
            .map(|s| s.pixmap)
            .unwrap_or(self.back_buffer)
    }

    fn set_foreground(&self, color: Color) -> Result<()> {
        self.conn
            .change_gc(self.gc, &ChangeGCAux::new().foreground(color.0))?;
        Ok(())
    }

    /// Open (or reuse) a core font roughly `size` pixels tall
    fn font(&mut self, size: u32) -> Result<(Font, i16)> {
        if let Some(font) = self.fonts.get(&size) {
            return Ok((font.id, font.ascent));
        }

        let pattern = format!("-*-fixed-medium-r-*-*-{}-*-*-*-*-*-iso8859-1", size);
        let id = self.conn.generate_id()?;
        let opened = match self.conn.open_font(id, pattern.as_bytes())?.check() {
            Ok(()) => true,
            Err(e) => {
                debug!("No font matches {}: {}, falling back to \"fixed\"", pattern, e);
                false
            }
        };
        if !opened {
            self.conn
                .open_font(id, b"fixed")?
                .check()
                .context("Failed to open fallback font \"fixed\"")?;
        }

        let ascent = self
            .conn
            .query_font(id)?
            .reply()
            .context("Failed to query font metrics")?
            .font_ascent;

        self.fonts.insert(size, LoadedFont { id, ascent });
        Ok((id, ascent))
    }

    fn resize_back_buffer(&mut self, width: u16, height: u16) -> Result<()> {
        let size = Size::new(width as u32, height as u32);
        if size == self.screen || width == 0 || height == 0 {
            return Ok(());
        }

        let pixmap = self.conn.generate_id()?;
        self.conn
            .create_pixmap(self.depth, pixmap, self.window, width, height)?
            .check()
            .context("Failed to resize back buffer")?;
        self.conn.free_pixmap(self.back_buffer)?;
        self.back_buffer = pixmap;
        self.screen = size;

        debug!("Screen resized to {}x{}", width, height);
        Ok(())
    }

    fn pump_events(&mut self) -> Result<()> {
        while let Some(event) = self.conn.poll_for_event()? {
            match event {
                Event::MotionNotify(e) => {
                    self.pending.pointer = Point::new(e.event_x as i32, e.event_y as i32);
                }
                Event::ButtonPress(e) => {
                    self.pending.pointer = Point::new(e.event_x as i32, e.event_y as i32);
                    match e.detail {
                        WHEEL_UP => self.pending.wheel += 1,
                        WHEEL_DOWN => self.pending.wheel -= 1,
                        detail => {
                            if let Some(button) = map_button(detail) {
                                self.pending.down.insert(button);
                                self.pending.pressed.insert(button);
                            }
                        }
                    }
                }
                Event::ButtonRelease(e) => {
                    self.pending.pointer = Point::new(e.event_x as i32, e.event_y as i32);
                    if let Some(button) = map_button(e.detail) {
                        self.pending.down.remove(button);
                        self.pending.released.insert(button);
                    }
                }
                Event::EnterNotify(e) => {
                    self.pending.pointer = Point::new(e.event_x as i32, e.event_y as i32);
                }
                Event::LeaveNotify(e) => {
                    debug!("Pointer left the window");
                    let at = Point::new(e.event_x as i32, e.event_y as i32);
                    self.pending.pointer = pointer_after_leave(&self.pending, at);
                }
                Event::ConfigureNotify(e) if e.window == self.window => {
                    self.resize_back_buffer(e.width, e.height)?;
                }
                Event::ClientMessage(e) => {
                    if e.format == 32
                        && e.type_ == self.atoms.wm_protocols
                        && e.data.as_data32()[0] == self.atoms.wm_delete_window
                    {
                        info!("Close requested by window manager");
                        self.close_requested = true;
                    }
                }
                Event::Error(e) => {
                    warn!("X11 error: {:?}", e);
                }
                other => {
                    trace!("Ignoring event {:?}", other);
                }
            }
        }
        Ok(())
    }
}

impl Backend for X11Backend {
    fn screen_size(&self) -> Size {
        self.screen
    }

    fn create_surface(&mut self, size: Size) -> Result<SurfaceId> {
        let pixmap = self.conn.generate_id()?;
        self.conn
            .create_pixmap(
                self.depth,
                pixmap,
                self.window,
                to_u16(size.width).max(1),
                to_u16(size.height).max(1),
            )?
            .check()
            .with_context(|| format!("Failed to create {}x{} surface", size.width, size.height))?;

        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(id, Surface { pixmap, size });

        debug!("Created surface {:?} ({}x{}) as pixmap {}", id, size.width, size.height, pixmap);
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) -> Result<()> {
        let Some(entry) = self.surfaces.remove(&surface) else {
            bail!("Unknown surface {:?}", surface);
        };
        if self.active == Some(surface) {
            self.active = None;
        }
        self.conn.free_pixmap(entry.pixmap)?;
        debug!("Destroyed surface {:?}", surface);
        Ok(())
    }

    fn begin_surface(&mut self, surface: SurfaceId) -> Result<()> {
        if !self.surfaces.contains_key(&surface) {
            bail!("Unknown surface {:?}", surface);
        }
        if let Some(active) = self.active {
            bail!("Surface {:?} is still the render target", active);
        }
        self.active = Some(surface);
        Ok(())
    }

    fn end_surface(&mut self) -> Result<()> {
        self.active = None;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        if rect.width == 0 || rect.height == 0 {
            return Ok(());
        }
        self.set_foreground(color)?;
        self.conn
            .poly_fill_rectangle(self.target(), self.gc, &[to_rectangle(rect)])?;
        Ok(())
    }

    fn draw_text(&mut self, origin: Point, size: u32, text: &str, color: Color) -> Result<()> {
        let (font, ascent) = self.font(size)?;
        if self.current_font != Some(font) {
            self.conn.change_gc(self.gc, &ChangeGCAux::new().font(font))?;
            self.current_font = Some(font);
        }
        self.set_foreground(color)?;

        let items = encode_text_items(text);
        if items.is_empty() {
            return Ok(());
        }
        self.conn.poly_text8(
            self.target(),
            self.gc,
            to_i16(origin.x),
            to_i16(origin.y + ascent as i32),
            &items,
        )?;
        Ok(())
    }

    fn blit_surface(&mut self, surface: SurfaceId, src: Rect, dest: Point) -> Result<()> {
        let Some(entry) = self.surfaces.get(&surface) else {
            bail!("Unknown surface {:?}", surface);
        };
        let width = src.width.min(entry.size.width);
        let height = src.height.min(entry.size.height);
        self.conn.copy_area(
            entry.pixmap,
            self.back_buffer,
            self.gc,
            to_i16(src.x),
            to_i16(src.y),
            to_i16(dest.x),
            to_i16(dest.y),
            to_u16(width),
            to_u16(height),
        )?;
        Ok(())
    }

    fn begin_frame(&mut self, clear: Color) -> Result<()> {
        self.pump_events()?;

        self.input = self.pending;
        self.pending.pressed = Default::default();
        self.pending.released = Default::default();
        self.pending.wheel = 0;

        self.set_foreground(clear)?;
        self.conn.poly_fill_rectangle(
            self.back_buffer,
            self.gc,
            &[to_rectangle(Rect::from_parts(Point::default(), self.screen))],
        )?;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.conn.copy_area(
            self.back_buffer,
            self.window,
            self.gc,
            0,
            0,
            0,
            0,
            to_u16(self.screen.width),
            to_u16(self.screen.height),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn input(&self) -> InputSnapshot {
        self.input
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        for (id, surface) in self.surfaces.drain() {
            debug!("Releasing surface {:?} at shutdown", id);
            let _ = self.conn.free_pixmap(surface.pixmap);
        }
        for font in self.fonts.values() {
            let _ = self.conn.close_font(font.id);
        }
        let _ = self.conn.free_pixmap(self.back_buffer);
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.destroy_window(self.window);
        if let Err(e) = self.conn.flush() {
            warn!("Failed to flush X11 connection on shutdown: {}", e);
        }
    }
}

/// Where the pointer is considered to be after it leaves the window
///
/// With a button held the last position is kept so a drag keeps tracking;
/// otherwise the pointer is parked away from every panel.
fn pointer_after_leave(input: &InputSnapshot, at: Point) -> Point {
    if input.down.is_empty() {
        POINTER_AWAY
    } else {
        at
    }
}

fn map_button(detail: u8) -> Option<MouseButton> {
    match detail {
        BUTTON_LEFT => Some(MouseButton::Left),
        BUTTON_MIDDLE => Some(MouseButton::Middle),
        BUTTON_RIGHT => Some(MouseButton::Right),
        _ => None,
    }
}

/// Build PolyText8 items: `[len, delta, bytes...]` per chunk of at most 254 bytes
fn encode_text_items(text: &str) -> Vec<u8> {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect();

    let mut items = Vec::with_capacity(bytes.len() + 2 * (bytes.len() / MAX_TEXT_ITEM + 1));
    for chunk in bytes.chunks(MAX_TEXT_ITEM) {
        items.push(chunk.len() as u8);
        items.push(0);
        items.extend_from_slice(chunk);
    }
    items
}

fn to_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn to_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

fn to_rectangle(rect: Rect) -> Rectangle {
    Rectangle {
        x: to_i16(rect.x),
        y: to_i16(rect.y),
        width: to_u16(rect.width),
        height: to_u16(rect.height),
    }
}
