use std::{io::Cursor, path::Path};

use geo::Coord;
use image::{imageops, ImageFormat, RgbaImage};

use crate::{config::FigureConfig, geom::BoundingBox, render::{draw::Px, Color}, PipelineError};

/// Space around the plot frame, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    /// Room for tick labels on the left and bottom plus axis titles.
    pub const STUDY_AREA: Margins = Margins { left: 72.0, right: 10.0, top: 10.0, bottom: 44.0 };
    /// Room for tick labels on all four sides.
    pub const OVERVIEW: Margins = Margins { left: 76.0, right: 76.0, top: 40.0, bottom: 40.0 };
}

/// A figure with a plot frame showing `viewport` at equal scale on both axes.
/// Plot layers draw onto a frame-sized image, which clips them; figure layers
/// draw around it after the frame is pasted in.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub(crate) figure: RgbaImage,
    pub(crate) plot: RgbaImage,
    /// Top-left corner of the frame in figure pixels.
    pub(crate) origin: (u32, u32),
    viewport: BoundingBox,
    dpi: f64,
}

impl Canvas {
    /// Fit the frame into the figure minus margins. The output image is cropped
    /// to frame plus margins, so wide or tall viewports give non-square images.
    pub fn new(figure: FigureConfig, margins: Margins, viewport: BoundingBox) -> Self {
        let dpi = figure.dpi as f64;
        let size = figure.pixels() as f64;
        let px = |points: f64| (points * dpi / 72.0).round();

        let (left, right, top, bottom) = (px(margins.left), px(margins.right), px(margins.top), px(margins.bottom));
        let avail_w = (size - left - right).max(1.0);
        let avail_h = (size - top - bottom).max(1.0);

        let aspect = if viewport.width() > 0.0 && viewport.height() > 0.0 {
            viewport.width() / viewport.height()
        } else {
            1.0
        };
        let (frame_w, frame_h) = if aspect >= avail_w / avail_h {
            (avail_w, avail_w / aspect)
        } else {
            (avail_h * aspect, avail_h)
        };
        let (frame_w, frame_h) = (frame_w.round().max(1.0) as u32, frame_h.round().max(1.0) as u32);

        let white = Color::WHITE.to_rgba();
        Self {
            figure: RgbaImage::from_pixel(left as u32 + frame_w + right as u32, top as u32 + frame_h + bottom as u32, white),
            plot: RgbaImage::from_pixel(frame_w, frame_h, white),
            origin: (left as u32, top as u32),
            viewport,
            dpi,
        }
    }

    #[inline] pub fn viewport(&self) -> &BoundingBox { &self.viewport }

    #[inline] pub fn dpi(&self) -> f64 { self.dpi }

    #[inline] pub fn frame_size(&self) -> (u32, u32) { self.plot.dimensions() }

    /// Points to pixels.
    #[inline] pub fn pt(&self, points: f64) -> f64 { points * self.dpi / 72.0 }

    /// Viewport coordinate to frame pixel.
    #[inline]
    pub fn to_pixel(&self, c: Coord<f64>) -> Px {
        let (w, h) = self.plot.dimensions();
        (
            (c.x - self.viewport.min_x) / self.viewport.width() * w as f64,
            (self.viewport.max_y - c.y) / self.viewport.height() * h as f64,
        )
    }

    /// Frame fraction (0..1 from the bottom-left corner) to frame pixel.
    #[inline]
    pub fn fraction_to_pixel(&self, fx: f64, fy: f64) -> Px {
        let (w, h) = self.plot.dimensions();
        (fx * w as f64, (1.0 - fy) * h as f64)
    }

    /// Frame pixel to figure pixel.
    #[inline]
    pub(crate) fn to_figure(&self, p: Px) -> Px {
        (p.0 + self.origin.0 as f64, p.1 + self.origin.1 as f64)
    }

    /// Paste the frame into the figure.
    pub(crate) fn flatten(&mut self) {
        imageops::replace(&mut self.figure, &self.plot, self.origin.0 as i64, self.origin.1 as i64);
    }

    pub(crate) fn into_view(self) -> MapView {
        MapView { image: self.figure, bbox: self.viewport }
    }
}

/// A finished map raster and the viewport it shows.
#[derive(Debug, Clone)]
pub struct MapView {
    pub image: RgbaImage,
    pub bbox: BoundingBox,
}

impl MapView {
    pub fn to_png(&self) -> Result<Vec<u8>, PipelineError> {
        encode_png(&self.image)
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Crs;

    fn figure() -> FigureConfig { FigureConfig { size_inches: 6.0, dpi: 100 } }

    #[test]
    fn square_viewport_gets_square_frame() {
        let canvas = Canvas::new(figure(), Margins::OVERVIEW, BoundingBox::new(70.0, 8.0, 80.0, 18.0, Crs::Geographic));
        let (w, h) = canvas.frame_size();
        assert_eq!(w, h);
        assert_eq!(canvas.figure.width(), canvas.origin.0 * 2 + w);
    }

    #[test]
    fn wide_viewport_is_cropped_tight() {
        let canvas = Canvas::new(figure(), Margins { left: 0.0, right: 0.0, top: 0.0, bottom: 0.0 },
            BoundingBox::new(0.0, 0.0, 2.0, 1.0, Crs::WebMercator));
        assert_eq!(canvas.frame_size(), (600, 300));
        assert_eq!(canvas.figure.dimensions(), (600, 300));
    }

    #[test]
    fn pixel_mapping_flips_y() {
        let canvas = Canvas::new(figure(), Margins { left: 0.0, right: 0.0, top: 0.0, bottom: 0.0 },
            BoundingBox::new(0.0, 0.0, 10.0, 10.0, Crs::Geographic));

        assert_eq!(canvas.to_pixel(Coord { x: 0.0, y: 10.0 }), (0.0, 0.0));
        assert_eq!(canvas.to_pixel(Coord { x: 10.0, y: 0.0 }), (600.0, 600.0));
        let (x, y) = canvas.fraction_to_pixel(0.75, 0.05);
        assert!((x - 450.0).abs() < 1e-9 && (y - 570.0).abs() < 1e-9);
        assert_eq!(canvas.pt(72.0), 100.0);
    }

    #[test]
    fn png_encoding_round_trips_dimensions() {
        let canvas = Canvas::new(figure(), Margins::OVERVIEW, BoundingBox::new(0.0, 0.0, 1.0, 1.0, Crs::Geographic));
        let view = canvas.into_view();
        let png = view.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), view.image.width());
    }
}
