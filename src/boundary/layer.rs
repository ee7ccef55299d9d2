use std::fmt;

use anyhow::{ensure, Result};
use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};

use crate::geom::{BoundingBox, Crs, ShapeIndex};

/// Administrative level of a boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    State,
    District,
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { AdminLevel::State => "state", AdminLevel::District => "district" })
    }
}

/// A borrowed view of one named polygon in a layer.
#[derive(Debug, Clone, Copy)]
pub struct AdministrativeBoundary<'a> {
    pub name: &'a str,
    pub level: AdminLevel,
    /// Parent state name, for districts.
    pub parent_state: Option<&'a str>,
    pub shape: &'a MultiPolygon<f64>,
}

/// Named polygons of one administrative level, in EPSG:4326, with a spatial index.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    level: AdminLevel,
    names: Vec<String>,
    parents: Vec<Option<String>>,
    index: ShapeIndex,
}

impl BoundaryLayer {
    /// Build a layer from `(name, parent_state, shape)` entries in geographic coordinates.
    pub fn new(level: AdminLevel, entries: Vec<(String, Option<String>, MultiPolygon<f64>)>) -> Self {
        let mut names = Vec::with_capacity(entries.len());
        let mut parents = Vec::with_capacity(entries.len());
        let mut shapes = Vec::with_capacity(entries.len());

        for (name, parent, shape) in entries {
            names.push(name);
            parents.push(parent);
            shapes.push(shape);
        }

        Self { level, names, parents, index: ShapeIndex::new(shapes, Crs::Geographic) }
    }

    #[inline] pub fn level(&self) -> AdminLevel { self.level }

    #[inline] pub fn len(&self) -> usize { self.names.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Get the boundary at a given position.
    pub fn get(&self, idx: usize) -> Option<AdministrativeBoundary<'_>> {
        Some(AdministrativeBoundary {
            name: self.names.get(idx)?,
            level: self.level,
            parent_state: self.parents.get(idx)?.as_deref(),
            shape: self.index.shapes().get(idx)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = AdministrativeBoundary<'_>> {
        (0..self.len()).filter_map(|idx| self.get(idx))
    }

    /// First boundary (in layer order) whose interior contains the point.
    pub fn locate(&self, point: Point<f64>) -> Option<AdministrativeBoundary<'_>> {
        self.index.locate(point).and_then(|idx| self.get(idx))
    }

    /// Positions of boundaries matching a predicate.
    pub fn select(&self, predicate: impl Fn(&AdministrativeBoundary<'_>) -> bool) -> Vec<usize> {
        self.iter().enumerate()
            .filter(|(_, boundary)| predicate(boundary))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Shapes at the given positions.
    pub fn shapes_of<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a MultiPolygon<f64>> + 'a {
        indices.iter().filter_map(|&idx| self.index.shapes().get(idx))
    }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.index.shapes() }

    /// Geographic bounding box of the boundaries at the given positions.
    #[inline]
    pub fn bounds_of(&self, indices: &[usize]) -> Option<BoundingBox> {
        self.index.bounds_of(indices.iter().copied())
    }

    #[inline] pub fn bounds(&self) -> Option<BoundingBox> { self.index.bounds() }
}

/// The state and district layers, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct Boundaries {
    states: BoundaryLayer,
    districts: BoundaryLayer,
}

impl Boundaries {
    pub fn new(states: BoundaryLayer, districts: BoundaryLayer) -> Result<Self> {
        ensure!(states.level() == AdminLevel::State,
            "[boundary] expected a state layer, got a {} layer", states.level());
        ensure!(districts.level() == AdminLevel::District,
            "[boundary] expected a district layer, got a {} layer", districts.level());

        Ok(Self { states, districts })
    }

    #[inline] pub fn states(&self) -> &BoundaryLayer { &self.states }

    #[inline] pub fn districts(&self) -> &BoundaryLayer { &self.districts }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    #[test]
    fn locate_and_select() {
        let layer = BoundaryLayer::new(AdminLevel::District, vec![
            ("Ernakulam".into(), Some("KERALA".into()), square(76.0, 9.5, 0.5)),
            ("Thrissur".into(), Some("KERALA".into()), square(76.0, 10.0, 0.5)),
            ("Coimbatore".into(), Some("TAMIL NADU".into()), square(76.5, 10.0, 0.5)),
        ]);

        let hit = layer.locate(Point::new(76.25, 9.75)).unwrap();
        assert_eq!(hit.name, "Ernakulam");
        assert_eq!(hit.parent_state, Some("KERALA"));
        assert_eq!(hit.level, AdminLevel::District);

        let kerala = layer.select(|d| d.parent_state == Some("KERALA"));
        assert_eq!(kerala, vec![0, 1]);
        assert_eq!(layer.bounds_of(&kerala), Some(BoundingBox::new(76.0, 9.5, 76.5, 10.5, Crs::Geographic)));
    }

    #[test]
    fn levels_are_checked() {
        let states = BoundaryLayer::new(AdminLevel::State, vec![]);
        let districts = BoundaryLayer::new(AdminLevel::District, vec![]);

        assert!(Boundaries::new(states.clone(), districts.clone()).is_ok());
        assert!(Boundaries::new(districts, states).is_err());
    }
}
