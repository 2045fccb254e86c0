//! Rendering configuration

use anyhow::Result;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Largest supported glyph/geometry multiplier
pub const MAX_SCALE: u32 = 8;
/// Largest cell padding, in unscaled pixels
pub const MAX_CELL_PADDING: u32 = 64;

/// Options controlling how a sheet region is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Integer multiplier applied to every dimension and glyph
    pub scale: u32,
    /// Horizontal space between gridline and text, in unscaled pixels
    pub cell_padding: u32,
    /// Column width used when the sheet defines none, in Excel character units
    pub default_column_width: f64,
    /// Row height used when the sheet defines none, in points
    pub default_row_height: f64,
    pub gridlines: bool,
    pub background: Color,
    pub gridline_color: Color,
    pub text_color: Color,
    pub error_color: Color,
    /// Upper bound on width * height of the output canvas
    pub max_pixels: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            cell_padding: 3,
            default_column_width: 8.43,
            default_row_height: 15.0,
            gridlines: true,
            background: Color([0xff, 0xff, 0xff]),
            gridline_color: Color([0xd4, 0xd4, 0xd4]),
            text_color: Color([0x00, 0x00, 0x00]),
            error_color: Color([0xc0, 0x00, 0x00]),
            max_pixels: 50_000_000,
        }
    }
}

impl RenderConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: RenderConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 || self.scale > MAX_SCALE {
            anyhow::bail!(
                "Configuration error: scale must be between 1 and {}, got {}",
                MAX_SCALE,
                self.scale
            );
        }
        if self.cell_padding > MAX_CELL_PADDING {
            anyhow::bail!(
                "Configuration error: cell_padding must be at most {}, got {}",
                MAX_CELL_PADDING,
                self.cell_padding
            );
        }
        if !(self.default_column_width.is_finite() && self.default_column_width > 0.0) {
            anyhow::bail!(
                "Configuration error: default_column_width must be positive, got {}",
                self.default_column_width
            );
        }
        if !(self.default_row_height.is_finite() && self.default_row_height > 0.0) {
            anyhow::bail!(
                "Configuration error: default_row_height must be positive, got {}",
                self.default_row_height
            );
        }
        if self.max_pixels == 0 {
            anyhow::bail!("Configuration error: max_pixels must be greater than 0");
        }
        Ok(())
    }
}

/// Opaque RGB color written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub fn to_rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, 0xff])
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{}', expected #rrggbb", value));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Color([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}
