use anyhow::{anyhow, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::geom::Crs;

/// Reprojects coordinates between the supported CRS pair.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    projs: Option<(Proj4, Proj4)>, // None when from == to
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

impl Reprojector {
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        if from == to {
            return Ok(Self { from, to, projs: None })
        }

        let build = |crs: Crs| {
            let proj_string = crs.proj4();
            Proj4::from_proj_string(proj_string)
                .map_err(|e| anyhow!("{e:?}"))
                .with_context(|| format!("[geom::proj] failed to build PROJ.4 for {crs}: {proj_string}"))
        };

        Ok(Self { from, to, projs: Some((build(from)?, build(to)?)) })
    }

    #[inline] pub fn source(&self) -> Crs { self.from }

    #[inline] pub fn target(&self) -> Crs { self.to }

    /// Transform one coordinate. Geographic coordinates are in degrees on both sides.
    pub fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let Some((from, to)) = &self.projs else { return Ok(coord) };

        let mut point = if self.from.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(from, to, &mut point)
            .map_err(|e| anyhow!("[geom::proj] {} -> {} failed at ({}, {}): {e:?}", self.from, self.to, coord.x, coord.y))?;

        Ok(if self.to.is_geographic() {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }

    /// Transform every vertex of a MultiPolygon.
    pub fn transform_multipolygon(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        shape.try_map_coords(|coord| self.transform(coord))
    }
}
