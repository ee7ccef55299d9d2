use anyhow::Result;
use geo::Coord;

use crate::{
    geom::{BoundingBox, Crs, Reprojector},
    render::{canvas::Canvas, draw, text::{self, Font, HAlign, TextStyle, VAlign}, Color},
};

/// Ticks per axis.
const TICKS: usize = 5;

/// A tick at a viewport coordinate with its degree label.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Which frame edges get something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sides {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Sides {
    pub const ALL: Sides = Sides { left: true, right: true, top: true, bottom: true };
    pub const LEFT_BOTTOM: Sides = Sides { left: true, right: false, top: false, bottom: true };
}

/// Tick marks, tick labels and optional axis titles around the frame. Sizes in points.
#[derive(Debug, Clone, PartialEq)]
pub struct TickStyle {
    pub length: f64,
    pub width: f64,
    pub pad: f64,
    pub font_size: f64,
    pub marks: Sides,
    pub labels: Sides,
    /// `(x title, y title, size)`.
    pub titles: Option<(String, String, f64)>,
}

impl TickStyle {
    pub fn study_area() -> Self {
        Self {
            length: 3.5,
            width: 0.8,
            pad: 3.5,
            font_size: 10.0,
            marks: Sides::ALL,
            labels: Sides::LEFT_BOTTOM,
            titles: Some(("Longitude".into(), "Latitude".into(), 12.0)),
        }
    }

    pub fn overview() -> Self {
        Self { length: 8.0, width: 1.5, pad: 10.0, font_size: 15.0, marks: Sides::ALL, labels: Sides::ALL, titles: None }
    }
}

/// Grid positions and labels for both axes, in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Graticule {
    pub xs: Vec<Tick>,
    pub ys: Vec<Tick>,
    pub style: TickStyle,
}

fn linspace(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
}

fn hemisphere(value: f64, positive: char, negative: char) -> String {
    if value < 0.0 {
        format!("{:.2}°{negative}", value.abs())
    } else {
        format!("{value:.2}°{positive}")
    }
}

impl Graticule {
    /// Five evenly spaced ticks between the geographic bounds of a Web-Mercator
    /// extent, labelled to two decimals with hemisphere letters.
    pub fn study_area(extent: &BoundingBox) -> Result<Self> {
        let geographic = extent.to_crs(Crs::Geographic)?;
        let forward = Reprojector::new(Crs::Geographic, extent.crs)?;

        let xs = linspace(geographic.min_x, geographic.max_x, TICKS)
            .map(|lon| Ok(Tick {
                position: forward.transform(Coord { x: lon, y: geographic.min_y })?.x,
                label: hemisphere(lon, 'E', 'W'),
            }))
            .collect::<Result<_>>()?;
        let ys = linspace(geographic.min_y, geographic.max_y, TICKS)
            .map(|lat| Ok(Tick {
                position: forward.transform(Coord { x: geographic.min_x, y: lat })?.y,
                label: hemisphere(lat, 'N', 'S'),
            }))
            .collect::<Result<_>>()?;

        Ok(Self { xs, ys, style: TickStyle::study_area() })
    }

    /// Five ticks across geographic bounds, rounded to a tenth of a degree.
    pub fn overview(bounds: &BoundingBox) -> Self {
        let round = |v: f64| (v * 10.0).round() / 10.0;
        let ticks = |lo: f64, hi: f64| -> Vec<Tick> {
            linspace(lo, hi, TICKS)
                .map(round)
                .map(|v| Tick { position: v, label: format!("{v:.1}°") })
                .collect()
        };

        Self { xs: ticks(bounds.min_x, bounds.max_x), ys: ticks(bounds.min_y, bounds.max_y), style: TickStyle::overview() }
    }
}

/// Dashed lines across the frame at every tick.
pub(crate) fn draw_grid_lines(canvas: &mut Canvas, graticule: &Graticule, color: Color, width_pt: f64) {
    let (w, h) = canvas.frame_size();
    let viewport = *canvas.viewport();
    let width = canvas.pt(width_pt).max(1.0);
    let dash = [canvas.pt(3.7 * width_pt).max(2.0), canvas.pt(1.6 * width_pt).max(1.0)];

    for tick in &graticule.xs {
        let (x, _) = canvas.to_pixel(Coord { x: tick.position, y: viewport.min_y });
        draw::stroke(&mut canvas.plot, &[(x, 0.0), (x, h as f64)], false, width, color, Some(dash));
    }
    for tick in &graticule.ys {
        let (_, y) = canvas.to_pixel(Coord { x: viewport.min_x, y: tick.position });
        draw::stroke(&mut canvas.plot, &[(0.0, y), (w as f64, y)], false, width, color, Some(dash));
    }
}

/// Tick marks outside the frame, plus labels and titles when a font is available.
pub(crate) fn draw_ticks(canvas: &mut Canvas, graticule: &Graticule, font: Option<&Font>) {
    let style = &graticule.style;
    let (w, h) = canvas.frame_size();
    let (w, h) = (w as f64, h as f64);
    let viewport = *canvas.viewport();
    let (length, pad, width) = (canvas.pt(style.length), canvas.pt(style.pad), canvas.pt(style.width).max(1.0));
    let label_style = TextStyle::plain(canvas.pt(style.font_size), Color::BLACK);

    // Outermost label edges in figure pixels, for placing the titles.
    let (mut lowest, mut leftmost) = (f64::NEG_INFINITY, f64::INFINITY);

    for tick in &graticule.xs {
        let (x, _) = canvas.to_pixel(Coord { x: tick.position, y: viewport.min_y });
        if !(-0.5..=w + 0.5).contains(&x) { continue }

        let top = canvas.to_figure((x, 0.0));
        let bottom = canvas.to_figure((x, h));
        if style.marks.top {
            draw::stroke(&mut canvas.figure, &[top, (top.0, top.1 - length)], false, width, Color::BLACK, None);
        }
        if style.marks.bottom {
            draw::stroke(&mut canvas.figure, &[bottom, (bottom.0, bottom.1 + length)], false, width, Color::BLACK, None);
        }
        let Some(font) = font else { continue };
        if style.labels.top {
            text::draw_text(&mut canvas.figure, font, &tick.label, (top.0, top.1 - length - pad), HAlign::Center, VAlign::Bottom, &label_style);
        }
        if style.labels.bottom {
            let (_, (_, y1)) = text::draw_text(&mut canvas.figure, font, &tick.label, (bottom.0, bottom.1 + length + pad),
                HAlign::Center, VAlign::Top, &label_style);
            lowest = lowest.max(y1);
        }
    }

    for tick in &graticule.ys {
        let (_, y) = canvas.to_pixel(Coord { x: viewport.min_x, y: tick.position });
        if !(-0.5..=h + 0.5).contains(&y) { continue }

        let left = canvas.to_figure((0.0, y));
        let right = canvas.to_figure((w, y));
        if style.marks.left {
            draw::stroke(&mut canvas.figure, &[left, (left.0 - length, left.1)], false, width, Color::BLACK, None);
        }
        if style.marks.right {
            draw::stroke(&mut canvas.figure, &[right, (right.0 + length, right.1)], false, width, Color::BLACK, None);
        }
        let Some(font) = font else { continue };
        if style.labels.left {
            let ((x0, _), _) = text::draw_text(&mut canvas.figure, font, &tick.label, (left.0 - length - pad, left.1),
                HAlign::Right, VAlign::Center, &label_style);
            leftmost = leftmost.min(x0);
        }
        if style.labels.right {
            text::draw_text(&mut canvas.figure, font, &tick.label, (right.0 + length + pad, right.1), HAlign::Left, VAlign::Center, &label_style);
        }
    }

    let (Some(font), Some((x_title, y_title, size))) = (font, &style.titles) else { return };
    let title_style = TextStyle::plain(canvas.pt(*size), Color::BLACK);
    let gap = canvas.pt(4.0);

    let (center_x, bottom) = canvas.to_figure((w / 2.0, h + length + pad));
    text::draw_text(&mut canvas.figure, font, x_title, (center_x, lowest.max(bottom) + gap), HAlign::Center, VAlign::Top, &title_style);

    let (left, center_y) = canvas.to_figure((-length - pad, h / 2.0));
    text::draw_text_vertical(&mut canvas.figure, font, y_title, (leftmost.min(left) - gap, center_y), HAlign::Right, VAlign::Center, &title_style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_area_labels_use_hemispheres() {
        let extent = BoundingBox::new(76.0, 9.9, 76.4, 10.1, Crs::Geographic).to_crs(Crs::WebMercator).unwrap();
        let graticule = Graticule::study_area(&extent).unwrap();

        assert_eq!(graticule.xs.len(), 5);
        assert_eq!(graticule.xs[0].label, "76.00°E");
        assert_eq!(graticule.xs[4].label, "76.40°E");
        assert_eq!(graticule.ys[2].label, "10.00°N");
        assert!((graticule.xs[0].position - extent.min_x).abs() < 1e-3);
        assert!((graticule.ys[4].position - extent.max_y).abs() < 1e-3);
    }

    #[test]
    fn western_and_southern_ticks() {
        assert_eq!(hemisphere(-43.2, 'E', 'W'), "43.20°W");
        assert_eq!(hemisphere(-22.91, 'N', 'S'), "22.91°S");
        assert_eq!(hemisphere(0.0, 'N', 'S'), "0.00°N");
    }

    #[test]
    fn overview_ticks_round_to_tenths() {
        let graticule = Graticule::overview(&BoundingBox::new(74.02, 8.12, 77.98, 10.74, Crs::Geographic));
        let labels: Vec<_> = graticule.xs.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["74.0°", "75.0°", "76.0°", "77.0°", "78.0°"]);
        assert_eq!(graticule.ys[0].position, 8.1);
    }
}
