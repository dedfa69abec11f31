//! Application state and the per-frame driver

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::canvas::{Canvas, MAX_CANVAS_SIDE};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::fps::FpsCounter;
use crate::render::{Backend, Color, InputSnapshot, MouseButton};
use crate::shared::{Point, Size};
use crate::wm::decorations::{ChromePalette, PixelPalette};
use crate::wm::{Desktop, Window, WindowId};

/// Canvas cells are drawn one screen pixel each
const CANVAS_PIXEL_SIZE: u32 = 1;

/// Content size of a `width` x `height` grid drawn `scale` pixels per cell
fn scaled(width: u32, height: u32, scale: u32) -> Option<Size> {
    Some(Size::new(width.checked_mul(scale)?, height.checked_mul(scale)?))
}

pub struct App {
    desktop: Desktop,
    dataset: Dataset,
    canvas: Canvas,
    sample_window: WindowId,
    canvas_window: WindowId,
    sample_index: usize,
    pixel_scale: u32,
    brush_radius: u32,
    pixels: PixelPalette,
    screen_color: Color,
    /// Last canvas cell painted by the current stroke
    last_stroke: Option<Point>,
    fps: FpsCounter,
}

impl App {
    /// Create both panels and their surfaces
    pub fn new<B: Backend + ?Sized>(backend: &mut B, config: &Config, dataset: Dataset) -> Result<Self> {
        let windows = &config.windows;
        let header = *dataset.header();
        let mut desktop = Desktop::new(ChromePalette::from_config(&config.colors));

        let sample_content = scaled(header.width, header.height, windows.pixel_scale)
            .with_context(|| {
                format!(
                    "{}x{} samples at pixel scale {} do not fit on screen",
                    header.width, header.height, windows.pixel_scale
                )
            })?;

        let canvas_size = Size::new(windows.canvas_width, windows.canvas_height);
        ensure!(
            canvas_size.width <= MAX_CANVAS_SIDE && canvas_size.height <= MAX_CANVAS_SIDE,
            "Canvas {}x{} exceeds {}x{}",
            canvas_size.width,
            canvas_size.height,
            MAX_CANVAS_SIDE,
            MAX_CANVAS_SIDE
        );
        let canvas_content = scaled(canvas_size.width, canvas_size.height, CANVAS_PIXEL_SIZE)
            .context("Canvas does not fit on screen")?;

        let sample_window = desktop.add_window(
            Window::new(
                backend,
                windows.sample_title.as_str(),
                Point::new(windows.sample_corner[0], windows.sample_corner[1]),
                sample_content,
                windows.border_size,
            )
            .context("Failed to create sample window")?,
        );

        let canvas_window = match Window::new(
            backend,
            windows.canvas_title.as_str(),
            Point::new(windows.canvas_corner[0], windows.canvas_corner[1]),
            canvas_content,
            windows.border_size,
        ) {
            Ok(window) => desktop.add_window(window),
            Err(e) => {
                if let Err(release) = desktop.destroy(backend) {
                    warn!("Failed to release sample window: {}", release);
                }
                return Err(e.context("Failed to create input window"));
            }
        };

        let mut sample_index = config.dataset.initial_sample;
        if sample_index >= dataset.len() {
            let clamped = dataset.len().saturating_sub(1);
            warn!(
                "Sample {} is out of range ({} samples), showing {}",
                sample_index,
                dataset.len(),
                clamped
            );
            sample_index = clamped;
        }

        Ok(Self {
            desktop,
            dataset,
            canvas: Canvas::new(canvas_size),
            sample_window,
            canvas_window,
            sample_index,
            pixel_scale: windows.pixel_scale,
            brush_radius: config.sketch.brush_radius,
            pixels: PixelPalette::from_config(&config.colors),
            screen_color: Color(config.colors.screen),
            last_stroke: None,
            fps: FpsCounter::default(),
        })
    }

    #[cfg(test)]
    pub fn desktop(&self) -> &Desktop {
        &self.desktop
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[cfg(test)]
    pub fn sample_window(&self) -> WindowId {
        self.sample_window
    }

    #[cfg(test)]
    pub fn canvas_window(&self) -> WindowId {
        self.canvas_window
    }

    #[cfg(test)]
    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Step through the dataset, wrapping at both ends
    pub fn step_sample(&mut self, delta: i64) {
        if self.dataset.is_empty() || delta == 0 {
            return;
        }
        let len = self.dataset.len();
        let next = (self.sample_index as i64 + delta).rem_euclid(len as i64) as usize;
        debug!("Browsing sample {} -> {}", self.sample_index, next);
        self.sample_index = next;
    }

    fn caption(&self) -> Option<String> {
        let label = self.dataset.label(self.sample_index)?;
        Some(format!("#{}  label {}", self.sample_index, label))
    }

    /// Wheel browsing on the sample window, painting and clearing on the canvas
    fn handle_content_input(&mut self, input: &InputSnapshot) {
        let hovered = self.desktop.hovered();
        let dragging = self.desktop.interaction().is_dragging();

        if hovered == Some(self.sample_window) && input.wheel != 0 {
            self.step_sample(-(input.wheel as i64));
        }

        if hovered != Some(self.canvas_window) || dragging {
            self.last_stroke = None;
            return;
        }

        if input.was_pressed(MouseButton::Middle) {
            info!("Clearing input canvas ({} cells inked)", self.canvas.ink());
            self.canvas.clear();
        }

        let painting = input.is_down(MouseButton::Left) || input.was_pressed(MouseButton::Left);
        let Some(window) = self.desktop.window(self.canvas_window) else {
            return;
        };
        if painting {
            let cell = window.content_cell(input.pointer, CANVAS_PIXEL_SIZE);
            let from = self.last_stroke.unwrap_or(cell);
            self.canvas.stroke(from, cell, self.brush_radius);
            self.last_stroke = Some(cell);
        } else {
            self.last_stroke = None;
        }
    }

    /// One frame: input, window interaction, render, composite, present
    pub fn frame<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        backend.begin_frame(self.screen_color)?;
        let input = backend.input();
        let screen = backend.screen_size();

        let events = self.desktop.update(&input, screen);
        if let Some(id) = events.hover_started {
            trace!("Hovering {:?}", id);
        }
        if events.drag_started || events.drag_ended {
            // A move gesture boundary never continues a paint stroke.
            self.last_stroke = None;
        }
        self.handle_content_input(&input);

        let chrome = *self.desktop.chrome();
        let caption = self.caption();
        let sample = self.dataset.sample(self.sample_index);
        let (sample_window, canvas_window) = (self.sample_window, self.canvas_window);
        let (pixels, scale, canvas) = (&self.pixels, self.pixel_scale, &self.canvas);

        self.desktop
            .render(backend, |id, window, backend, highlighted| {
                if id == sample_window {
                    if let Some(sample) = &sample {
                        window.draw_pixels(backend, sample, scale, pixels)?;
                    }
                    if let Some(caption) = &caption {
                        window.draw_caption(backend, &chrome, highlighted, caption)?;
                    }
                } else if id == canvas_window {
                    window.draw_pixels(backend, canvas, CANVAS_PIXEL_SIZE, pixels)?;
                }
                Ok(())
            })
            .context("Render pass failed")?;

        self.desktop
            .composite(backend)
            .context("Composite pass failed")?;
        self.desktop.finish_frame();
        backend.end_frame()?;

        if self.fps.tick().is_some() {
            debug!("{:.1} fps", self.fps.fps());
        }
        Ok(())
    }

    /// Drive frames at `target_fps` until the window closes or a shutdown
    /// message arrives, then release every surface.
    pub async fn run<B: Backend + ?Sized>(
        mut self,
        backend: &mut B,
        target_fps: u32,
        mut shutdown: mpsc::Receiver<()>,
    ) -> Result<()> {
        let period = Duration::from_secs_f64(1.0 / target_fps.max(1) as f64);
        let mut clock = tokio::time::interval(period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Entering frame loop at {} fps", target_fps);

        let result = loop {
            tokio::select! {
                _ = clock.tick() => {
                    if backend.should_close() {
                        info!("Window closed, leaving frame loop");
                        break Ok(());
                    }
                    if let Err(e) = self.frame(backend) {
                        break Err(e);
                    }
                }
                Some(()) = shutdown.recv() => {
                    info!("Shutdown requested, leaving frame loop");
                    break Ok(());
                }
            }
        };

        let released = self.shutdown(backend);
        match (result, released) {
            (Err(e), Err(release)) => {
                error!("Failed to release surfaces after frame error: {:#}", release);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), released) => released,
        }
    }

    /// Release all window surfaces
    pub fn shutdown<B: Backend + ?Sized>(self, backend: &mut B) -> Result<()> {
        info!("Releasing window surfaces");
        self.desktop.destroy(backend)
    }
}
