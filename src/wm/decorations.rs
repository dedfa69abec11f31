//! Window decorations (background and title bar) for digit-board windows

use crate::config::ColorConfig;
use crate::render::Color;

/// Colours used for window chrome
///
/// Hover feedback is purely a colour swap: a highlighted window gets a light
/// background with dark title text, a normal one the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromePalette {
    pub background: Color,
    pub background_highlight: Color,
    pub title: Color,
    pub title_highlight: Color,
}

impl ChromePalette {
    pub fn from_config(colors: &ColorConfig) -> Self {
        Self {
            background: Color(colors.chrome),
            background_highlight: Color(colors.chrome_highlight),
            title: Color(colors.title),
            title_highlight: Color(colors.title_highlight),
        }
    }

    pub fn background(&self, highlighted: bool) -> Color {
        if highlighted {
            self.background_highlight
        } else {
            self.background
        }
    }

    pub fn title(&self, highlighted: bool) -> Color {
        if highlighted {
            self.title_highlight
        } else {
            self.title
        }
    }
}

impl Default for ChromePalette {
    fn default() -> Self {
        Self::from_config(&ColorConfig::default())
    }
}

/// Colours for pixel grid content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPalette {
    /// Colour of zero-intensity cells
    pub paper: Color,
    /// Colour of full-intensity cells
    pub ink: Color,
}

impl PixelPalette {
    pub fn from_config(colors: &ColorConfig) -> Self {
        Self {
            paper: Color(colors.paper),
            ink: Color(colors.ink),
        }
    }

    /// Colour for `value` on a `0..=max` intensity scale
    pub fn shade(&self, value: u8, max: u8) -> Color {
        self.paper.lerp(self.ink, value as u32, max.max(1) as u32)
    }
}

impl Default for PixelPalette {
    fn default() -> Self {
        Self::from_config(&ColorConfig::default())
    }
}

/// Title text height for a border size
pub fn title_text_size(border: u32) -> u32 {
    border * 3 / 2
}

/// Vertical title inset inside the title bar
pub fn title_inset_y(border: u32) -> i32 {
    (border / 4) as i32
}
