use geo::{BoundingRect, Coord, LineString, MultiPolygon};
use image::{imageops::{self, FilterType}, RgbaImage};

use crate::{
    config::{LabelStyle, MarkerStyle, ScaleBarStyle},
    error::Warning,
    geom::{BoundingBox, CrsMismatch},
    render::{
        canvas::{Canvas, MapView},
        draw::{self, Px},
        graticule::{self, Graticule},
        text::{self, Font, HAlign, TextStyle, VAlign},
        Color,
    },
};

/// Meters per degree of latitude, for scale bars on geographic viewports.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Fill and edge of polygon layers. Widths in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub fill: Option<Color>,
    pub edge: Color,
    pub edge_width: f64,
}

impl PolygonStyle {
    #[inline] pub fn filled(fill: Color, edge: Color, edge_width: f64) -> Self { Self { fill: Some(fill), edge, edge_width } }

    #[inline] pub fn outline(edge: Color, edge_width: f64) -> Self { Self { fill: None, edge, edge_width } }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dashed: bool,
}

/// One drawable element of a map. Coordinates are in the viewport's CRS.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Raster covering exactly the viewport.
    Basemap(RgbaImage),
    GridLines { graticule: Graticule, color: Color, width: f64 },
    Context { shapes: Vec<MultiPolygon<f64>>, style: PolygonStyle },
    Highlight { shapes: Vec<MultiPolygon<f64>>, style: PolygonStyle },
    Outline { shapes: Vec<MultiPolygon<f64>>, style: PolygonStyle },
    ExtentRect { bbox: BoundingBox, style: LineStyle },
    Markers { points: Vec<Coord<f64>>, style: MarkerStyle },
    Labels { labels: Vec<(Coord<f64>, String)>, style: LabelStyle },
    ScaleBar(ScaleBarStyle),
    NorthArrow { image: RgbaImage, position: [f64; 2], zoom: f64 },
    /// Tick marks and labels outside the frame.
    Ticks(Graticule),
    /// Frame border, in points.
    Border { width: f64 },
}

impl Layer {
    /// Drawing order; lower first.
    pub fn z(&self) -> u8 {
        match self {
            Layer::Basemap(_) => 0,
            Layer::GridLines { .. } => 1,
            Layer::Context { .. } => 2,
            Layer::Highlight { .. } => 3,
            Layer::Outline { .. } => 4,
            Layer::ExtentRect { .. } => 5,
            Layer::Markers { .. } => 6,
            Layer::Labels { .. } => 7,
            Layer::ScaleBar(_) => 8,
            Layer::NorthArrow { .. } => 9,
            Layer::Ticks(_) => 10,
            Layer::Border { .. } => 11,
        }
    }

    /// Layers drawn around the frame rather than clipped inside it.
    #[inline] fn is_figure_level(&self) -> bool { self.z() >= 10 }

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Basemap(_) => "basemap",
            Layer::GridLines { .. } => "grid",
            Layer::Context { .. } => "context polygons",
            Layer::Highlight { .. } => "highlighted polygons",
            Layer::Outline { .. } => "outlines",
            Layer::ExtentRect { .. } => "study-area rectangle",
            Layer::Markers { .. } => "markers",
            Layer::Labels { .. } => "labels",
            Layer::ScaleBar(_) => "scale bar",
            Layer::NorthArrow { .. } => "north arrow",
            Layer::Ticks(_) => "ticks",
            Layer::Border { .. } => "border",
        }
    }
}

/// A rendered map with the warnings collected while drawing it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub view: MapView,
    pub warnings: Vec<Warning>,
}

/// Draw every successful layer in z-order and collect the failed ones as warnings.
/// Text is skipped when no font is given.
pub fn render(mut canvas: Canvas, layers: Vec<Result<Layer, Warning>>, font: Option<&Font>) -> Rendered {
    let mut warnings = Vec::new();
    let mut layers: Vec<Layer> = layers.into_iter()
        .filter_map(|layer| layer.map_err(|w| warnings.push(w)).ok())
        .collect();
    layers.sort_by_key(Layer::z);

    let (figure, plot): (Vec<_>, Vec<_>) = layers.into_iter().partition(Layer::is_figure_level);
    for layer in plot {
        tracing::trace!("[render] {}", layer.name());
        if let Err(warning) = draw_plot_layer(&mut canvas, layer, font) {
            warnings.push(warning);
        }
    }
    canvas.flatten();
    for layer in figure {
        tracing::trace!("[render] {}", layer.name());
        match layer {
            Layer::Ticks(graticule) => graticule::draw_ticks(&mut canvas, &graticule, font),
            Layer::Border { width } => draw_border(&mut canvas, width),
            _ => {}
        }
    }

    Rendered { view: canvas.into_view(), warnings }
}

fn draw_plot_layer(canvas: &mut Canvas, layer: Layer, font: Option<&Font>) -> Result<(), Warning> {
    match layer {
        Layer::Basemap(image) => {
            let (w, h) = canvas.frame_size();
            let image = if image.dimensions() == (w, h) { image } else { imageops::resize(&image, w, h, FilterType::Triangle) };
            imageops::overlay(&mut canvas.plot, &image, 0, 0);
        }
        Layer::GridLines { graticule, color, width } => graticule::draw_grid_lines(canvas, &graticule, color, width),
        Layer::Context { shapes, style } | Layer::Highlight { shapes, style } | Layer::Outline { shapes, style } => {
            draw_polygons(canvas, &shapes, style)
        }
        Layer::ExtentRect { bbox, style } => draw_extent_rect(canvas, &bbox, style)?,
        Layer::Markers { points, style } => {
            let diameter = canvas.pt(style.size.max(0.0).sqrt());
            let edge_width = canvas.pt(style.edge_width);
            for point in points {
                let center = canvas.to_pixel(point);
                draw::marker(&mut canvas.plot, center, style.shape, diameter, style.color, style.edge_color, edge_width);
            }
        }
        Layer::Labels { labels, style } => {
            let Some(font) = font else { return Ok(()) };
            let text_style = TextStyle { size_px: canvas.pt(style.size), color: style.color, bold: style.bold, background: style.background };
            let (dx, dy) = (canvas.pt(style.offset[0]), canvas.pt(style.offset[1]));
            for (point, label) in labels {
                let (x, y) = canvas.to_pixel(point);
                text::draw_text(&mut canvas.plot, font, &label, (x + dx, y - dy), HAlign::Left, VAlign::Bottom, &text_style);
            }
        }
        Layer::ScaleBar(style) => draw_scale_bar(canvas, &style, font),
        Layer::NorthArrow { image, position, zoom } => {
            let scale = zoom * canvas.dpi() / 72.0;
            let w = (image.width() as f64 * scale).round().max(1.0) as u32;
            let h = (image.height() as f64 * scale).round().max(1.0) as u32;
            let arrow = imageops::resize(&image, w, h, FilterType::Lanczos3);
            let (cx, cy) = canvas.fraction_to_pixel(position[0], position[1]);
            imageops::overlay(&mut canvas.plot, &arrow, (cx - w as f64 / 2.0).round() as i64, (cy - h as f64 / 2.0).round() as i64);
        }
        Layer::Ticks(_) | Layer::Border { .. } => {}
    }
    Ok(())
}

fn ring_pixels(canvas: &Canvas, ring: &LineString<f64>) -> Vec<Px> {
    ring.coords().map(|&c| canvas.to_pixel(c)).collect()
}

fn draw_polygons(canvas: &mut Canvas, shapes: &[MultiPolygon<f64>], style: PolygonStyle) {
    let viewport = canvas.viewport().to_rect();
    let edge_width = canvas.pt(style.edge_width);

    for polygon in shapes.iter().flatten() {
        let visible = polygon.bounding_rect().is_some_and(|r| {
            r.min().x <= viewport.max().x && r.max().x >= viewport.min().x
                && r.min().y <= viewport.max().y && r.max().y >= viewport.min().y
        });
        if !visible { continue }

        let rings: Vec<Vec<Px>> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| ring_pixels(canvas, ring))
            .collect();

        if let Some(fill) = style.fill {
            draw::fill_rings(&mut canvas.plot, &rings, fill);
        }
        if edge_width > 0.0 {
            for ring in &rings {
                draw::stroke(&mut canvas.plot, ring, true, edge_width, style.edge, None);
            }
        }
    }
}

fn draw_extent_rect(canvas: &mut Canvas, bbox: &BoundingBox, style: LineStyle) -> Result<(), Warning> {
    let viewport = *canvas.viewport();
    if bbox.crs != viewport.crs {
        return Err(Warning::decoration("study-area rectangle", CrsMismatch { left: bbox.crs, right: viewport.crs }));
    }
    // Drawn whole and clipped by the frame; the intersection only decides visibility.
    if !matches!(bbox.intersection(&viewport), Ok(Some(_))) {
        tracing::debug!("[render] study-area rectangle lies outside the viewport");
        return Ok(())
    }

    let corners = [
        Coord { x: bbox.min_x, y: bbox.min_y },
        Coord { x: bbox.max_x, y: bbox.min_y },
        Coord { x: bbox.max_x, y: bbox.max_y },
        Coord { x: bbox.min_x, y: bbox.max_y },
    ];
    let path: Vec<Px> = corners.into_iter().map(|c| canvas.to_pixel(c)).collect();
    let width = canvas.pt(style.width);
    let dash = style.dashed.then(|| [canvas.pt(3.7 * style.width), canvas.pt(1.6 * style.width)]);
    draw::stroke(&mut canvas.plot, &path, true, width, style.color, dash);
    Ok(())
}

/// Length of the bar in viewport units.
fn scale_bar_units(style: &ScaleBarStyle, viewport: &BoundingBox) -> f64 {
    if viewport.crs.is_geographic() {
        style.meters() / (METERS_PER_DEGREE * viewport.center().y.to_radians().cos().max(1e-6))
    } else {
        style.meters()
    }
}

fn draw_scale_bar(canvas: &mut Canvas, style: &ScaleBarStyle, font: Option<&Font>) {
    let viewport = *canvas.viewport();
    let (frame_w, _) = canvas.frame_size();
    let length = scale_bar_units(style, &viewport) / viewport.width() * frame_w as f64;

    let (x0, y) = canvas.fraction_to_pixel(style.position[0], style.position[1]);
    let width = canvas.pt(style.line_width);
    draw::stroke(&mut canvas.plot, &[(x0, y), (x0 + length, y)], false, width, Color::BLACK, None);

    let Some(font) = font else { return };
    let label_style = TextStyle { size_px: canvas.pt(style.font_size), color: Color::BLACK, bold: true, background: None };
    let anchor = (x0 + length / 2.0, y - width / 2.0 - canvas.pt(2.0));
    text::draw_text(&mut canvas.plot, font, &style.label(), anchor, HAlign::Center, VAlign::Bottom, &label_style);
}

fn draw_border(canvas: &mut Canvas, width_pt: f64) {
    let (w, h) = canvas.frame_size();
    let corners = [(0.0, 0.0), (w as f64, 0.0), (w as f64, h as f64), (0.0, h as f64)];
    let path: Vec<Px> = corners.into_iter().map(|p| canvas.to_figure(p)).collect();
    let width = canvas.pt(width_pt).max(1.0);
    draw::stroke(&mut canvas.figure, &path, true, width, Color::BLACK, None);
}
