use std::collections::BTreeSet;

use anyhow::anyhow;
use geo::MultiPolygon;

use crate::{
    boundary::{AdministrativeBoundary, Boundaries},
    config::OverviewConfig,
    geom::{square_bounds_with_buffer, BoundingBox, Crs},
    render::{render, Canvas, Color, Font, Graticule, Layer, LineStyle, Margins, PolygonStyle, Rendered},
    PipelineError,
};

const GRID_WIDTH: f64 = 0.5;
const GRID_OPACITY: f64 = 0.7;
const SPINE_WIDTH: f64 = 0.8;

/// Names from the state and district layers are matched ignoring case and
/// surrounding whitespace.
#[inline]
fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn cloned<'a>(shapes: impl Iterator<Item = &'a MultiPolygon<f64>>) -> Vec<MultiPolygon<f64>> {
    shapes.cloned().collect()
}

/// Square geographic frame around `bounds` with grid lines, ticks on every side and a border.
fn overview(config: &OverviewConfig, bounds: &BoundingBox, mut layers: Vec<Layer>, font: Option<&Font>) -> Rendered {
    let viewport = square_bounds_with_buffer(bounds, config.buffer);
    let canvas = Canvas::new(config.figure, Margins::OVERVIEW, viewport);
    let graticule = Graticule::overview(&viewport);

    layers.push(Layer::GridLines { graticule: graticule.clone(), color: Color::GRID.with_opacity(GRID_OPACITY), width: GRID_WIDTH });
    layers.push(Layer::Ticks(graticule));
    layers.push(Layer::Border { width: SPINE_WIDTH });

    render(canvas, layers.into_iter().map(Ok).collect(), font)
}

fn missing(what: String) -> PipelineError {
    PipelineError::Boundary(anyhow!("[maps::overview] {what} is not in the boundary data"))
}

/// Every state in gray with the detected state highlighted, framed on the whole country.
pub fn country_map(boundaries: &Boundaries, state: &str, config: &OverviewConfig, font: Option<&Font>) -> Result<Rendered, PipelineError> {
    let states = boundaries.states();
    let selected = states.select(|b| same_name(b.name, state));
    if selected.is_empty() { return Err(missing(format!("state {state:?}"))) }
    let bounds = states.bounds().ok_or_else(|| missing("any state".into()))?;

    let layers = vec![
        Layer::Context { shapes: states.shapes().to_vec(), style: PolygonStyle::filled(config.context, Color::BLACK, 0.5) },
        Layer::Highlight { shapes: cloned(states.shapes_of(&selected)), style: PolygonStyle::filled(config.highlight, Color::BLACK, 2.5) },
    ];
    Ok(overview(config, &bounds, layers, font))
}

/// Districts of the detected state, covered ones highlighted, inside the state outline.
pub fn state_map(
    boundaries: &Boundaries,
    state: &str,
    covered: &BTreeSet<String>,
    config: &OverviewConfig,
    font: Option<&Font>,
) -> Result<Rendered, PipelineError> {
    let states = boundaries.states();
    let districts = boundaries.districts();

    let outline = states.select(|b| same_name(b.name, state));
    let bounds = states.bounds_of(&outline).ok_or_else(|| missing(format!("state {state:?}")))?;

    let in_state = |b: &AdministrativeBoundary<'_>| b.parent_state.is_some_and(|p| same_name(p, state));
    let members = districts.select(in_state);
    let highlighted = districts.select(|b| in_state(b) && covered.contains(b.name));
    if members.is_empty() {
        tracing::warn!("[maps::overview] no districts list {state:?} as their state");
    }

    let layers = vec![
        Layer::Context { shapes: cloned(districts.shapes_of(&members)), style: PolygonStyle::filled(config.context, Color::BLACK, 0.7) },
        Layer::Highlight { shapes: cloned(districts.shapes_of(&highlighted)), style: PolygonStyle::filled(config.highlight, Color::BLACK, 2.0) },
        Layer::Outline { shapes: cloned(states.shapes_of(&outline)), style: PolygonStyle::outline(Color::BLACK, 2.0) },
    ];
    Ok(overview(config, &bounds, layers, font))
}

/// Outlines of the covered districts with the study-area extent drawn over them.
/// `None` when no covered district belongs to the detected state.
pub fn district_map(
    boundaries: &Boundaries,
    state: &str,
    covered: &BTreeSet<String>,
    study_area_extent: &BoundingBox,
    config: &OverviewConfig,
    font: Option<&Font>,
) -> Result<Option<Rendered>, PipelineError> {
    let districts = boundaries.districts();
    let selected = districts.select(|b| {
        b.parent_state.is_some_and(|p| same_name(p, state)) && covered.contains(b.name)
    });
    let Some(bounds) = districts.bounds_of(&selected) else {
        tracing::warn!("[maps::overview] none of {covered:?} belongs to {state:?}; skipping the district map");
        return Ok(None)
    };

    // The study area is in Web Mercator; the overview frame is geographic.
    let extent = study_area_extent.to_crs(Crs::Geographic).map_err(PipelineError::Geometry)?;

    let layers = vec![
        Layer::Outline { shapes: cloned(districts.shapes_of(&selected)), style: PolygonStyle::outline(Color::BLACK, 2.5) },
        Layer::ExtentRect { bbox: extent, style: LineStyle { color: config.extent, width: 2.0, dashed: true } },
    ];
    Ok(Some(overview(config, &bounds, layers, font)))
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Coord};

    use super::*;
    use crate::{
        boundary::{AdminLevel, BoundaryLayer},
        config::FigureConfig,
        geom::padded_extent,
    };

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![(x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size)]])
    }

    fn boundaries() -> Boundaries {
        let states = BoundaryLayer::new(AdminLevel::State, vec![
            ("KERALA".into(), None, square(76.0, 9.0, 2.0)),
            ("TAMIL NADU".into(), None, square(78.0, 9.0, 2.0)),
        ]);
        let districts = BoundaryLayer::new(AdminLevel::District, vec![
            ("Ernakulam".into(), Some("KERALA".into()), square(76.0, 9.5, 0.5)),
            ("Idukki".into(), Some("Kerala".into()), square(76.5, 9.5, 0.5)),
            ("Madurai".into(), Some("TAMIL NADU".into()), square(78.0, 9.5, 0.5)),
        ]);
        Boundaries::new(states, districts).unwrap()
    }

    fn config() -> OverviewConfig {
        OverviewConfig { figure: FigureConfig { size_inches: 3.0, dpi: 100 }, ..OverviewConfig::default() }
    }

    fn covered(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overview_frames_are_square() {
        let rendered = country_map(&boundaries(), "KERALA", &config(), None).unwrap();
        let bbox = rendered.view.bbox;

        assert!((bbox.width() - bbox.height()).abs() < 1e-9);
        assert_eq!(bbox.crs, Crs::Geographic);
        assert!(rendered.view.image.pixels().any(|p| *p == Color::ACCENT.to_rgba()));
        assert!(rendered.warnings.is_empty());
    }

    #[test]
    fn unknown_state_is_an_error() {
        assert!(matches!(country_map(&boundaries(), "GOA", &config(), None), Err(PipelineError::Boundary(_))));
        assert!(matches!(state_map(&boundaries(), "GOA", &covered(&[]), &config(), None), Err(PipelineError::Boundary(_))));
    }

    #[test]
    fn state_map_frames_the_state() {
        let rendered = state_map(&boundaries(), "KERALA", &covered(&["Ernakulam"]), &config(), None).unwrap();
        let bbox = rendered.view.bbox;

        assert!((bbox.center().x - 77.0).abs() < 1e-9);
        assert!((bbox.center().y - 10.0).abs() < 1e-9);
        assert!(rendered.view.image.pixels().any(|p| *p == Color::ACCENT.to_rgba()));
    }

    #[test]
    fn district_map_needs_a_covered_district_in_the_state() {
        let extent = padded_extent(&[Coord { x: 76.2, y: 9.6 }, Coord { x: 76.6, y: 9.9 }], 0.15).unwrap();

        let none = district_map(&boundaries(), "KERALA", &covered(&["Madurai"]), &extent, &config(), None).unwrap();
        assert!(none.is_none());

        let rendered = district_map(&boundaries(), "KERALA", &covered(&["Ernakulam", "Idukki"]), &extent, &config(), None)
            .unwrap()
            .unwrap();
        assert!(rendered.warnings.is_empty(), "{:?}", rendered.warnings);
        assert!((rendered.view.bbox.center().x - 76.5).abs() < 1e-9);
        assert!(rendered.view.image.pixels().any(|p| *p == Color::RED.to_rgba()));
    }
}
