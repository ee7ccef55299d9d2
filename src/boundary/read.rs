use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{dbase::{FieldValue, Record}, PolygonRing, Reader, Shape};

use crate::{
    boundary::{AdminLevel, Boundaries, BoundaryLayer},
    config::BoundaryConfig,
    geom::{Crs, Reprojector},
};

/// Convert a shapefile polygon to a geo MultiPolygon; each outer ring starts a
/// new polygon and collects the inner rings that follow it.
fn shp_to_geo(polygon: &shapefile::Polygon) -> MultiPolygon<f64> {
    fn closed(points: &[shapefile::Point]) -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = points.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        LineString(coords)
    }

    let mut polygons = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();

    for ring in polygon.rings() {
        match ring {
            PolygonRing::Outer(points) => {
                if let Some(previous) = exterior.replace(closed(points)) {
                    polygons.push(Polygon::new(previous, std::mem::take(&mut holes)));
                }
            }
            PolygonRing::Inner(points) => holes.push(closed(points)),
        }
    }
    if let Some(last) = exterior {
        polygons.push(Polygon::new(last, holes));
    }

    MultiPolygon(polygons)
}

/// Read a text attribute; Ok(None) for a null or blank value, Err if the field is absent.
fn text_field(record: &Record, field: &str) -> Result<Option<String>> {
    let value = match record.get(field) {
        None => bail!("missing attribute field {field:?}"),
        Some(FieldValue::Character(Some(s))) | Some(FieldValue::Memo(s)) => s.trim().to_string(),
        Some(FieldValue::Numeric(Some(n))) => n.to_string(),
        Some(FieldValue::Integer(n)) => n.to_string(),
        Some(FieldValue::Character(None)) | Some(FieldValue::Numeric(None)) => String::new(),
        Some(other) => bail!("attribute field {field:?} has unsupported type {:?}", other.field_type()),
    };
    Ok((!value.is_empty()).then_some(value))
}

/// Decide the CRS of a shapefile from its `.prj` sidecar. No sidecar means geographic.
fn detect_crs(path: &Path) -> Result<Crs> {
    let prj = path.with_extension("prj");
    if !prj.exists() { return Ok(Crs::Geographic) }

    let wkt = fs::read_to_string(&prj)
        .with_context(|| format!("[boundary] failed to read {}", prj.display()))?;

    if !wkt.trim_start().to_ascii_uppercase().starts_with("PROJCS") {
        return Ok(Crs::Geographic)
    }

    let upper = wkt.to_ascii_uppercase();
    let mercator = ["PSEUDO-MERCATOR", "PSEUDO_MERCATOR", "MERCATOR_AUXILIARY_SPHERE", "POPULAR VISUALISATION", "3857"]
        .iter()
        .any(|marker| upper.contains(marker));

    if mercator {
        Ok(Crs::WebMercator)
    } else {
        bail!("[boundary] {} uses an unsupported projected CRS; reproject it to EPSG:4326 or EPSG:3857", prj.display())
    }
}

/// Load one polygon layer from a shapefile, reprojecting Web Mercator input to EPSG:4326.
pub fn read_layer(level: AdminLevel, path: &Path, name_field: &str, parent_field: Option<&str>) -> Result<BoundaryLayer> {
    let crs = detect_crs(path)?;
    let reprojector = Reprojector::new(crs, Crs::Geographic)?;

    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[boundary] failed to open shapefile: {}", path.display()))?;

    let mut entries = Vec::with_capacity(reader.shape_count()?);
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("[boundary] error reading shape {i} of {}", path.display()))?;

        let shape = match shape {
            Shape::Polygon(polygon) => shp_to_geo(&polygon),
            Shape::NullShape => continue,
            other => bail!("[boundary] found non-Polygon shape in {}: {:?}", path.display(), other.shapetype()),
        };

        let Some(name) = text_field(&record, name_field).with_context(|| format!("[boundary] record {i} of {}", path.display()))? else {
            tracing::warn!("[boundary] skipping unnamed {level} at record {i} of {}", path.display());
            continue
        };
        let parent = match parent_field {
            Some(field) => text_field(&record, field).with_context(|| format!("[boundary] record {i} of {}", path.display()))?,
            None => None,
        };

        entries.push((name, parent, reprojector.transform_multipolygon(&shape)?));
    }

    tracing::info!("[boundary] loaded {} {level} polygons from {} ({crs})", entries.len(), path.display());
    Ok(BoundaryLayer::new(level, entries))
}

impl Boundaries {
    /// Load both layers from the configured shapefiles.
    pub fn load(config: &BoundaryConfig) -> Result<Self> {
        let states = read_layer(AdminLevel::State, &config.states, &config.state_name_field, None)?;
        let districts = read_layer(
            AdminLevel::District,
            &config.districts,
            &config.district_name_field,
            Some(&config.district_state_field),
        )?;
        Boundaries::new(states, districts)
    }
}
