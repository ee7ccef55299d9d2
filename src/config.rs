//! Style and data-source configuration, loadable from a JSON document.
//! Every field has a default, so `{}` is a valid configuration.

use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::render::{Basemap, Color};

/// Where the administrative boundaries come from and which attributes name them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// State polygon shapefile.
    pub states: PathBuf,
    /// District polygon shapefile.
    pub districts: PathBuf,
    /// State name attribute of the state layer.
    pub state_name_field: String,
    /// District name attribute of the district layer.
    pub district_name_field: String,
    /// Parent state attribute of the district layer.
    pub district_state_field: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            states: PathBuf::from("data/India_State_Boundary_UPPERCASE.shp"),
            districts: PathBuf::from("data/DISTRICT_BOUNDARY_CLEANED.shp"),
            state_name_field: "State_Name".to_string(),
            district_name_field: "District".to_string(),
            district_state_field: "STATE".to_string(),
        }
    }
}

/// A square figure; point sizes convert to pixels as `pt * dpi / 72`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub size_inches: f64,
    pub dpi: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self { size_inches: 6.0, dpi: 100 }
    }
}

impl FigureConfig {
    #[inline] pub fn pixels(&self) -> u32 { (self.size_inches * self.dpi as f64).round() as u32 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerShape {
    #[serde(alias = "o")]
    Circle,
    #[serde(alias = "s")]
    Square,
    #[serde(alias = "^")]
    TriangleUp,
    #[serde(alias = "v")]
    TriangleDown,
    #[serde(alias = "D")]
    Diamond,
    #[serde(alias = "*")]
    Star,
    #[serde(alias = "+")]
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub color: Color,
    /// Marker area in pt²; the drawn diameter is `sqrt(size)` points.
    pub size: f64,
    pub edge_color: Color,
    /// Edge width in points.
    pub edge_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self { shape: MarkerShape::Circle, color: Color::RED, size: 50.0, edge_color: Color::BLACK, edge_width: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    /// Font size in points.
    pub size: f64,
    pub color: Color,
    pub bold: bool,
    /// Offset from the site in points, x right and y up.
    pub offset: [f64; 2],
    /// Fill behind the text, if any.
    pub background: Option<Color>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self { size: 9.0, color: Color::BLACK, bold: false, offset: [0.0, 0.0], background: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleUnit {
    Meters,
    Kilometers,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleBarStyle {
    pub enabled: bool,
    pub length: f64,
    pub unit: ScaleUnit,
    /// Left end of the bar as a fraction of the frame, from the bottom-left corner.
    pub position: [f64; 2],
    /// Line width in points.
    pub line_width: f64,
    /// Label size in points.
    pub font_size: f64,
}

impl Default for ScaleBarStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            length: 2.0,
            unit: ScaleUnit::Kilometers,
            position: [0.75, 0.05],
            line_width: 3.0,
            font_size: 10.0,
        }
    }
}

impl ScaleBarStyle {
    /// Bar length in meters.
    #[inline]
    pub fn meters(&self) -> f64 {
        match self.unit { ScaleUnit::Meters => self.length, ScaleUnit::Kilometers => self.length * 1000.0 }
    }

    /// `"2 km"`, `"500 m"`.
    pub fn label(&self) -> String {
        let unit = match self.unit { ScaleUnit::Meters => "m", ScaleUnit::Kilometers => "km" };
        format!("{} {unit}", self.length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NorthArrowStyle {
    /// PNG image of the arrow; None disables it.
    pub path: Option<PathBuf>,
    /// Center of the arrow as a fraction of the frame, from the bottom-left corner.
    pub position: [f64; 2],
    /// Image scale; drawn at `zoom * dpi / 72` pixels per source pixel.
    pub zoom: f64,
}

impl Default for NorthArrowStyle {
    fn default() -> Self {
        Self { path: Some(PathBuf::from("assets/north_arrow.png")), position: [0.92, 0.92], zoom: 0.06 }
    }
}

/// The detailed map of the sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyAreaConfig {
    pub figure: FigureConfig,
    /// Fraction of each axis span added around the sites.
    pub padding: f64,
    pub basemap: Basemap,
    pub marker: MarkerStyle,
    pub label: LabelStyle,
    pub scale_bar: ScaleBarStyle,
    pub north_arrow: NorthArrowStyle,
}

impl Default for StudyAreaConfig {
    fn default() -> Self {
        Self {
            figure: FigureConfig { size_inches: 10.0, dpi: 300 },
            padding: crate::geom::STUDY_AREA_PADDING,
            basemap: Basemap::OpenStreetMap,
            marker: MarkerStyle::default(),
            label: LabelStyle::default(),
            scale_bar: ScaleBarStyle::default(),
            north_arrow: NorthArrowStyle::default(),
        }
    }
}

/// The country, state and district locator maps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    pub figure: FigureConfig,
    /// Fraction of the square span added on every side.
    pub buffer: f64,
    pub context: Color,
    pub highlight: Color,
    pub extent: Color,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            figure: FigureConfig { size_inches: 6.0, dpi: 100 },
            buffer: crate::geom::OVERVIEW_BUFFER,
            context: Color::LIGHT_GRAY,
            highlight: Color::ACCENT,
            extent: Color::RED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Width of each overview in the left column.
    pub small_width: u32,
    /// Width of the study-area map in the right column.
    pub big_width: u32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self { small_width: 300, big_width: 700 }
    }
}

/// HTTP settings for basemap tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Upper bound on tiles fetched for one basemap; zoom drops until it fits.
    pub max_tiles: usize,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("papermap/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 20,
            max_tiles: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub boundaries: BoundaryConfig,
    pub study_area: StudyAreaConfig,
    pub overview: OverviewConfig,
    pub composite: CompositeConfig,
    pub tiles: TileConfig,
    /// TrueType font for labels and ticks; common system fonts are tried when unset.
    pub font: Option<PathBuf>,
    /// Draw text (labels, ticks, scale-bar caption). Off renders geometry only.
    pub draw_text: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            boundaries: BoundaryConfig::default(),
            study_area: StudyAreaConfig::default(),
            overview: OverviewConfig::default(),
            composite: CompositeConfig::default(),
            tiles: TileConfig::default(),
            font: None,
            draw_text: true,
        }
    }
}

impl MapConfig {
    /// Read a configuration document; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[config] failed to open {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[config] failed to parse {}", path.display()))?;
        tracing::debug!("[config] loaded {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config: MapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.boundaries.state_name_field, "State_Name");
        assert_eq!(config.study_area.figure.pixels(), 3000);
        assert_eq!(config.overview.figure.pixels(), 600);
        assert_eq!(config.composite, CompositeConfig { small_width: 300, big_width: 700 });
        assert_eq!(config.study_area.marker.color, Color::RED);
        assert!(config.draw_text);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r##"{{
            "study_area": {{ "marker": {{ "shape": "^", "color": "#0000ff" }}, "scale_bar": {{ "length": 500, "unit": "meters" }} }},
            "draw_text": false
        }}"##).unwrap();

        let config = MapConfig::load(file.path()).unwrap();
        assert_eq!(config.study_area.marker.shape, MarkerShape::TriangleUp);
        assert_eq!(config.study_area.marker.size, 50.0);
        assert_eq!(config.study_area.scale_bar.label(), "500 m");
        assert_eq!(config.study_area.scale_bar.meters(), 500.0);
        assert_eq!(config.study_area.label.size, 9.0);
        assert!(!config.draw_text);
    }

    #[test]
    fn partial_figure_fills_missing_fields() {
        let config: MapConfig = serde_json::from_str(r#"{ "overview": { "figure": { "dpi": 150 } } }"#).unwrap();
        assert_eq!(config.overview.figure, FigureConfig { size_inches: 6.0, dpi: 150 });
        assert_eq!(config.overview.figure.pixels(), 900);
    }

    #[test]
    fn default_scale_bar_is_two_kilometers() {
        let bar = ScaleBarStyle::default();
        assert_eq!(bar.label(), "2 km");
        assert_eq!(bar.meters(), 2000.0);
    }
}
