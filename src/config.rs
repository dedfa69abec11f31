//! Configuration system for digit-board
//!
//! Loads configuration from TOML at `~/.config/digit-board/config.toml`, or
//! from an explicit path. Auto-generates the default file on first run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::canvas::{MAX_BRUSH_RADIUS, MAX_CANVAS_SIDE};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub dataset: DatasetConfig,
    pub windows: WindowsConfig,
    pub colors: ColorConfig,
    pub sketch: SketchConfig,
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`
    ///
    /// An explicit path must exist. A missing default file is created with
    /// default values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    info!("Config file not found at {:?}, using defaults", default_path);
                    if let Err(e) = Self::save_default(&default_path) {
                        warn!("Failed to create default config file: {}", e);
                    }
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {:?}", config_path))?;
        config.sanitize();

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("digit-board");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }

    /// Replace values the frame loop cannot work with
    fn sanitize(&mut self) {
        if self.display.target_fps == 0 {
            warn!("display.target_fps must be positive, using 60");
            self.display.target_fps = 60;
        }
        if self.display.width == 0 || self.display.height == 0 {
            warn!("display size must be positive, using 800x600");
            self.display.width = 800;
            self.display.height = 600;
        }
        if self.windows.pixel_scale == 0 {
            warn!("windows.pixel_scale must be positive, using 1");
            self.windows.pixel_scale = 1;
        }
        if self.sketch.brush_radius > MAX_BRUSH_RADIUS {
            warn!(
                "sketch.brush_radius {} is too large, using {}",
                self.sketch.brush_radius, MAX_BRUSH_RADIUS
            );
            self.sketch.brush_radius = MAX_BRUSH_RADIUS;
        }
        let windows = &mut self.windows;
        if windows.canvas_width > MAX_CANVAS_SIDE || windows.canvas_height > MAX_CANVAS_SIDE {
            warn!(
                "canvas {}x{} exceeds {}x{}, clamping",
                windows.canvas_width, windows.canvas_height, MAX_CANVAS_SIDE, MAX_CANVAS_SIDE
            );
            windows.canvas_width = windows.canvas_width.min(MAX_CANVAS_SIDE);
            windows.canvas_height = windows.canvas_height.min(MAX_CANVAS_SIDE);
        }
    }
}

/// Application window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Title of the application window
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Frame clock rate
    pub target_fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "digit-board".to_string(),
            width: 800,
            height: 600,
            target_fps: 60,
        }
    }
}

/// Dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to an optdigits-orig style bitmap file
    pub path: PathBuf,
    /// Sample shown at startup
    pub initial_sample: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(
                "archive.ics.uci.edu/ml/machine-learning-databases/optdigits/optdigits-orig.tra",
            ),
            initial_sample: 500,
        }
    }
}

/// Panel geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    /// Border width in pixels; the title bar is one border high
    pub border_size: u32,
    /// Screen pixels per sample pixel
    pub pixel_scale: u32,
    /// Sketch canvas size in cells (one screen pixel each)
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Initial top-left corners as `[x, y]`
    pub sample_corner: [i32; 2],
    pub canvas_corner: [i32; 2],
    pub sample_title: String,
    pub canvas_title: String,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            border_size: 10,
            pixel_scale: 8,
            canvas_width: 400,
            canvas_height: 400,
            sample_corner: [10, 40],
            canvas_corner: [300, 40],
            sample_title: "Sample(s)".to_string(),
            canvas_title: "Input".to_string(),
        }
    }
}

/// Colours (hex: 0xRRGGBB)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Screen background behind all windows
    pub screen: u32,
    /// Window background
    pub chrome: u32,
    /// Window background while hovered
    pub chrome_highlight: u32,
    /// Title text
    pub title: u32,
    /// Title text while hovered
    pub title_highlight: u32,
    /// Set pixels
    pub ink: u32,
    /// Unset pixels
    pub paper: u32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            screen: 0x828282,
            chrome: 0x505050,
            chrome_highlight: 0xffffff,
            title: 0xffffff,
            title_highlight: 0x505050,
            ink: 0xffffff,
            paper: 0x000000,
        }
    }
}

/// Sketching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Brush radius in canvas cells
    pub brush_radius: u32,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self { brush_radius: 12 }
    }
}
