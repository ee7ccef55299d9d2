//! Colors as they appear in style documents: `#rrggbb`, `#rrggbbaa` or a few names.

use std::{fmt, str::FromStr};

use image::Rgba;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}; expected #rrggbb, #rrggbbaa or a basic color name")]
pub struct ColorError(String);

/// Straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    /// Context fill for overview polygons.
    pub const LIGHT_GRAY: Color = Color::rgb(0xe5, 0xe5, 0xe5);
    /// Highlight fill for the detected state and covered districts.
    pub const ACCENT: Color = Color::rgb(0xff, 0x66, 0x66);
    /// Overview graticule.
    pub const GRID: Color = Color::rgb(0xcc, 0xcc, 0xcc);

    #[inline] pub const fn rgb(r: u8, g: u8, b: u8) -> Self { Self { r, g, b, a: 255 } }

    /// Same color with alpha scaled by `opacity` in [0, 1].
    #[inline]
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self { a: (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8, ..self }
    }

    #[inline] pub fn to_rgba(self) -> Rgba<u8> { Rgba([self.r, self.g, self.b, self.a]) }
}

impl fmt::Display for Color {
    /// Format as `#rrggbb`, or `#rrggbbaa` when translucent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 { write!(f, "{:02x}", self.a)?; }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let named = match text.as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::RED),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            _ => None,
        };
        if let Some(color) = named { return Ok(color) }

        let hex = text.strip_prefix('#').ok_or_else(|| ColorError(s.to_string()))?;
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ColorError(s.to_string()))
        };

        match hex.len() {
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: byte(6)? }),
            _ => Err(ColorError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Color> for String {
    fn from(color: Color) -> Self { color.to_string() }
}
