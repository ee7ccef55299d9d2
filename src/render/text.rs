use std::{fmt, fs, path::Path};

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, bail, Context, Result};
use image::{imageops, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::render::{draw::Px, Color};

/// Fonts tried when none is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A TrueType font used for every text element of a map.
pub struct Font {
    font: FontVec,
    source: String,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font").field("source", &self.source).finish()
    }
}

impl Font {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("[render::text] failed to read font {}", path.display()))?;
        Self::from_bytes(bytes, path.display().to_string())
    }

    pub fn from_bytes(bytes: Vec<u8>, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let font = FontVec::try_from_vec(bytes).map_err(|e| anyhow!("[render::text] invalid font {source}: {e}"))?;
        Ok(Self { font, source })
    }

    /// Load the configured font, or the first system font that exists.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured { return Self::from_file(path) }

        for candidate in SYSTEM_FONTS.iter().map(Path::new).filter(|p| p.exists()) {
            match Self::from_file(candidate) {
                Ok(font) => {
                    tracing::debug!("[render::text] using system font {}", candidate.display());
                    return Ok(font)
                }
                Err(e) => tracing::debug!("{e:#}"),
            }
        }
        bail!("no usable TrueType font found; set `font` in the configuration")
    }

    /// Width and height in pixels of a line of text.
    #[inline]
    pub fn measure(&self, text: &str, size_px: f64) -> (u32, u32) {
        text_size(PxScale::from(size_px as f32), &self.font, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HAlign { Left, Center, Right }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VAlign { Top, Center, Bottom }

/// How a run of text is drawn.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextStyle {
    pub size_px: f64,
    pub color: Color,
    pub bold: bool,
    pub background: Option<Color>,
}

impl TextStyle {
    #[inline]
    pub(crate) fn plain(size_px: f64, color: Color) -> Self {
        Self { size_px, color, bold: false, background: None }
    }
}

/// Rasterize text onto a transparent image with every covered pixel in the text color.
fn rasterize(font: &Font, text: &str, style: &TextStyle) -> RgbaImage {
    let scale = PxScale::from(style.size_px as f32);
    let (w, h) = text_size(scale, &font.font, text);
    let stroke = if style.bold { (style.size_px / 20.0).ceil().max(1.0) as u32 } else { 0 };

    let mut image = RgbaImage::new(w + stroke + 1, h + 1);
    for dx in 0..=stroke {
        draw_text_mut(&mut image, style.color.to_rgba(), dx as i32, 0, scale, &font.font, text);
    }
    // draw_text_mut weights the color against the transparent background
    for pixel in image.pixels_mut().filter(|p| p[3] > 0) {
        pixel[0] = style.color.r;
        pixel[1] = style.color.g;
        pixel[2] = style.color.b;
    }
    image
}

/// Draw text anchored at `anchor` by the given alignment; returns the covered box.
pub(crate) fn draw_text(image: &mut RgbaImage, font: &Font, text: &str, anchor: Px, h: HAlign, v: VAlign, style: &TextStyle) -> (Px, Px) {
    let glyphs = rasterize(font, text, style);
    place(image, &glyphs, anchor, h, v, style)
}

/// Draw text rotated a quarter turn counter-clockwise, reading bottom to top.
pub(crate) fn draw_text_vertical(image: &mut RgbaImage, font: &Font, text: &str, anchor: Px, h: HAlign, v: VAlign, style: &TextStyle) -> (Px, Px) {
    let glyphs = imageops::rotate270(&rasterize(font, text, style));
    place(image, &glyphs, anchor, h, v, style)
}

fn place(image: &mut RgbaImage, glyphs: &RgbaImage, anchor: Px, h: HAlign, v: VAlign, style: &TextStyle) -> (Px, Px) {
    let (w, ht) = (glyphs.width() as f64, glyphs.height() as f64);
    let x = match h { HAlign::Left => anchor.0, HAlign::Center => anchor.0 - w / 2.0, HAlign::Right => anchor.0 - w };
    let y = match v { VAlign::Top => anchor.1, VAlign::Center => anchor.1 - ht / 2.0, VAlign::Bottom => anchor.1 - ht };

    if let Some(background) = style.background {
        let pad = style.size_px * 0.2;
        super::draw::fill_rect(image, (x - pad, y - pad), (x + w + pad, y + ht + pad), background);
    }
    imageops::overlay(image, glyphs, x.round() as i64, y.round() as i64);

    ((x, y), (x + w, y + ht))
}
