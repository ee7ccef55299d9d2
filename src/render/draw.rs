//! Pixel-level primitives. Coordinates are f64 pixels with y growing downward;
//! pixel (i, j) is sampled at its center (i + 0.5, j + 0.5).

use std::f64::consts::{FRAC_PI_2, TAU};

use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, Canvas};

use crate::{config::MarkerShape, render::Color};

pub(crate) type Px = (f64, f64);

/// Source-over blending view of an image, for imageproc drawing calls.
pub(crate) struct Blended<'a>(pub &'a mut RgbaImage);

impl Canvas for Blended<'_> {
    type Pixel = Rgba<u8>;

    fn dimensions(&self) -> (u32, u32) { self.0.dimensions() }

    fn get_pixel(&self, x: u32, y: u32) -> Self::Pixel { *self.0.get_pixel(x, y) }

    fn draw_pixel(&mut self, x: u32, y: u32, color: Self::Pixel) {
        self.0.get_pixel_mut(x, y).blend(&color);
    }
}

/// Fill the region enclosed by the rings with the even-odd rule, so inner rings punch holes.
pub(crate) fn fill_rings(image: &mut RgbaImage, rings: &[Vec<Px>], color: Color) {
    let (width, height) = image.dimensions();
    let (ymin, ymax) = rings.iter().flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if !(ymin.is_finite() && ymax.is_finite()) || height == 0 { return }

    let first_row = (ymin - 0.5).ceil().max(0.0);
    let last_row = (ymax - 0.5).floor().min(height as f64 - 1.0);
    if last_row < first_row { return }

    let rgba = color.to_rgba();
    let mut crossings = Vec::new();
    for row in first_row as u32..=last_row as u32 {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            for (a, b) in ring.iter().zip(ring.iter().cycle().skip(1)) {
                if (a.1 <= yc) != (b.1 <= yc) {
                    crossings.push(a.0 + (yc - a.1) * (b.0 - a.0) / (b.1 - a.1));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let first_col = (span[0] - 0.5).ceil().max(0.0);
            let last_col = (span[1] - 0.5).floor().min(width as f64 - 1.0);
            if last_col < first_col { continue }
            for col in first_col as u32..=last_col as u32 {
                image.get_pixel_mut(col, row).blend(&rgba);
            }
        }
    }
}

/// Axis-aligned filled rectangle.
#[inline]
pub(crate) fn fill_rect(image: &mut RgbaImage, min: Px, max: Px, color: Color) {
    fill_rings(image, &[vec![min, (max.0, min.1), max, (min.0, max.1)]], color);
}

/// Polygon approximating a circle.
pub(crate) fn circle_ring(center: Px, radius: f64) -> Vec<Px> {
    let segments = ((radius * 2.0).ceil() as usize).clamp(12, 96);
    (0..segments)
        .map(|i| {
            let angle = TAU * i as f64 / segments as f64;
            (center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
        })
        .collect()
}

/// Split a path into the "on" pieces of a dash pattern `[on, off]` (pixels).
fn dash_pieces(edges: impl Iterator<Item = (Px, Px)>, dash: [f64; 2]) -> Vec<(Px, Px)> {
    let mut pieces = Vec::new();
    let (mut on, mut remaining) = (true, dash[0]);

    for (a, b) in edges {
        let length = (b.0 - a.0).hypot(b.1 - a.1);
        if length <= f64::EPSILON { continue }
        let at = |t: f64| (a.0 + (b.0 - a.0) * t / length, a.1 + (b.1 - a.1) * t / length);

        let mut t = 0.0;
        while length - t > 1e-9 {
            let step = remaining.min(length - t);
            if on { pieces.push((at(t), at(t + step))); }
            t += step;
            remaining -= step;
            if remaining <= 1e-9 {
                on = !on;
                remaining = if on { dash[0] } else { dash[1] };
            }
        }
    }
    pieces
}

/// Thick segment as a filled quad; hairlines fall back to a one-pixel line.
fn segment(image: &mut RgbaImage, a: Px, b: Px, width: f64, color: Color) {
    if width < 1.5 {
        draw_line_segment_mut(&mut Blended(image), (a.0 as f32, a.1 as f32), (b.0 as f32, b.1 as f32), color.to_rgba());
        return
    }

    let length = (b.0 - a.0).hypot(b.1 - a.1);
    if length <= f64::EPSILON { return }
    let (nx, ny) = (-(b.1 - a.1) / length * width / 2.0, (b.0 - a.0) / length * width / 2.0);

    fill_rings(image, &[vec![(a.0 + nx, a.1 + ny), (b.0 + nx, b.1 + ny), (b.0 - nx, b.1 - ny), (a.0 - nx, a.1 - ny)]], color);
}

/// Stroke a polyline, optionally closed and dashed (`[on, off]` in pixels).
pub(crate) fn stroke(image: &mut RgbaImage, path: &[Px], closed: bool, width: f64, color: Color, dash: Option<[f64; 2]>) {
    if path.len() < 2 || width <= 0.0 { return }

    let closing = closed.then(|| (path[path.len() - 1], path[0]));
    let edges = path.windows(2).map(|w| (w[0], w[1])).chain(closing);

    match dash.filter(|d| d[0] > 0.0 && d[1] > 0.0) {
        Some(dash) => {
            for (a, b) in dash_pieces(edges, dash) {
                segment(image, a, b, width, color);
            }
        }
        None => {
            for (a, b) in edges {
                segment(image, a, b, width, color);
            }
            // Round joins
            if width >= 3.0 {
                let joints = if closed { path } else { &path[1..path.len() - 1] };
                for &joint in joints {
                    fill_rings(image, &[circle_ring(joint, width / 2.0)], color);
                }
            }
        }
    }
}

/// Outline of a marker of the given diameter, centered on `center`.
fn marker_ring(shape: MarkerShape, center: Px, diameter: f64) -> Vec<Px> {
    let r = diameter / 2.0;
    let (cx, cy) = center;
    match shape {
        MarkerShape::Circle => circle_ring(center, r),
        MarkerShape::Square => vec![(cx - r, cy - r), (cx + r, cy - r), (cx + r, cy + r), (cx - r, cy + r)],
        MarkerShape::TriangleUp => vec![(cx, cy - r), (cx + r, cy + r), (cx - r, cy + r)],
        MarkerShape::TriangleDown => vec![(cx, cy + r), (cx - r, cy - r), (cx + r, cy - r)],
        MarkerShape::Diamond => vec![(cx, cy - r), (cx + r, cy), (cx, cy + r), (cx - r, cy)],
        MarkerShape::Star => (0..10)
            .map(|i| {
                let radius = if i % 2 == 0 { r } else { r * 0.381966 };
                let angle = -FRAC_PI_2 + TAU * i as f64 / 10.0;
                (cx + radius * angle.cos(), cy + radius * angle.sin())
            })
            .collect(),
        MarkerShape::Plus => Vec::new(),
    }
}

/// Draw one marker: filled shape plus edge, or two strokes for `Plus`.
pub(crate) fn marker(image: &mut RgbaImage, center: Px, shape: MarkerShape, diameter: f64, fill: Color, edge: Color, edge_width: f64) {
    let r = diameter / 2.0;
    if shape == MarkerShape::Plus {
        let width = (diameter * 0.15).max(1.0);
        stroke(image, &[(center.0 - r, center.1), (center.0 + r, center.1)], false, width, fill, None);
        stroke(image, &[(center.0, center.1 - r), (center.0, center.1 + r)], false, width, fill, None);
        return
    }

    let ring = marker_ring(shape, center, diameter);
    fill_rings(image, std::slice::from_ref(&ring), fill);
    if edge_width > 0.0 {
        stroke(image, &ring, true, edge_width, edge, None);
    }
}
