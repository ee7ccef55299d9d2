use geo::{Coord, Rect};
use thiserror::Error;

use crate::geom::{Crs, Reprojector};

/// Binary box operations require both operands in the same CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bounding boxes are in different CRS ({left} vs {right})")]
pub struct CrsMismatch {
    pub left: Crs,
    pub right: Crs,
}

/// An axis-aligned rectangle tagged with the CRS its coordinates are in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub crs: Crs,
}

impl BoundingBox {
    /// Build a box from two corners in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64, crs: Crs) -> Self {
        Self { min_x: x0.min(x1), min_y: y0.min(y1), max_x: x0.max(x1), max_y: y0.max(y1), crs }
    }

    /// Smallest box covering every coordinate, or None for an empty iterator.
    pub fn from_coords(coords: impl IntoIterator<Item = Coord<f64>>, crs: Crs) -> Option<Self> {
        coords.into_iter()
            .map(|c| Self::new(c.x, c.y, c.x, c.y, crs))
            .reduce(|a, b| Self {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
                crs,
            })
    }

    #[inline]
    pub fn from_rect(rect: Rect<f64>, crs: Crs) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y, crs)
    }

    #[inline] pub fn width(&self) -> f64 { self.max_x - self.min_x }

    #[inline] pub fn height(&self) -> f64 { self.max_y - self.min_y }

    #[inline]
    pub fn center(&self) -> Coord<f64> {
        Coord { x: (self.min_x + self.max_x) / 2.0, y: (self.min_y + self.max_y) / 2.0 }
    }

    #[inline]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(Coord { x: self.min_x, y: self.min_y }, Coord { x: self.max_x, y: self.max_y })
    }

    /// Closed containment: points on the edge count.
    #[inline]
    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// Open containment: points on the edge do not count.
    #[inline]
    pub fn strictly_contains(&self, c: Coord<f64>) -> bool {
        c.x > self.min_x && c.x < self.max_x && c.y > self.min_y && c.y < self.max_y
    }

    /// True if `other` lies strictly inside `self` on every side.
    pub fn strictly_contains_box(&self, other: &BoundingBox) -> Result<bool, CrsMismatch> {
        self.check_crs(other)?;
        Ok(other.min_x > self.min_x && other.max_x < self.max_x
            && other.min_y > self.min_y && other.max_y < self.max_y)
    }

    pub fn union(&self, other: &BoundingBox) -> Result<BoundingBox, CrsMismatch> {
        self.check_crs(other)?;
        Ok(Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            crs: self.crs,
        })
    }

    /// Overlap of two boxes; `Ok(None)` when they are disjoint.
    pub fn intersection(&self, other: &BoundingBox) -> Result<Option<BoundingBox>, CrsMismatch> {
        self.check_crs(other)?;
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);

        Ok((min_x <= max_x && min_y <= max_y)
            .then_some(Self { min_x, min_y, max_x, max_y, crs: self.crs }))
    }

    /// Reproject through the four corners. Both supported CRS are axis-separable,
    /// so the corners map onto the corners of the result.
    pub fn to_crs(&self, target: Crs) -> anyhow::Result<BoundingBox> {
        if target == self.crs { return Ok(*self) }

        let reprojector = Reprojector::new(self.crs, target)?;
        let corners = [
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.min_x, y: self.max_y },
            Coord { x: self.max_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
        ];

        let projected = corners.into_iter()
            .map(|corner| reprojector.transform(corner))
            .collect::<anyhow::Result<Vec<_>>>()?;

        BoundingBox::from_coords(projected, target)
            .ok_or_else(|| anyhow::anyhow!("[geom::bbox] empty corner set"))
    }

    #[inline]
    fn check_crs(&self, other: &BoundingBox) -> Result<(), CrsMismatch> {
        if self.crs == other.crs { Ok(()) } else { Err(CrsMismatch { left: self.crs, right: other.crs }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_crs_operations_are_rejected() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0, Crs::Geographic);
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0, Crs::WebMercator);

        assert_eq!(a.union(&b), Err(CrsMismatch { left: Crs::Geographic, right: Crs::WebMercator }));
        assert!(a.intersection(&b).is_err());
        assert!(a.strictly_contains_box(&b).is_err());
    }

    #[test]
    fn intersection_and_union() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0, Crs::Geographic);
        let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0, Crs::Geographic);
        let c = BoundingBox::new(5.0, 5.0, 6.0, 6.0, Crs::Geographic);

        assert_eq!(a.intersection(&b).unwrap(), Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0, Crs::Geographic)));
        assert_eq!(a.intersection(&c).unwrap(), None);
        assert_eq!(a.union(&c).unwrap(), BoundingBox::new(0.0, 0.0, 6.0, 6.0, Crs::Geographic));
    }

    #[test]
    fn reprojection_round_trip() {
        let original = BoundingBox::new(76.1, 9.8, 76.5, 10.2, Crs::Geographic);
        let projected = original.to_crs(Crs::WebMercator).unwrap();
        let back = projected.to_crs(Crs::Geographic).unwrap();

        assert_eq!(projected.crs, Crs::WebMercator);
        assert!(projected.width() > 40_000.0, "{projected:?}");
        for (a, b) in [(original.min_x, back.min_x), (original.min_y, back.min_y),
                       (original.max_x, back.max_x), (original.max_y, back.max_y)] {
            assert!((a - b).abs() < 1e-9, "{original:?} != {back:?}");
        }
    }

    #[test]
    fn edge_points_are_not_strictly_inside() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0, Crs::WebMercator);
        assert!(b.contains(Coord { x: 0.0, y: 0.5 }));
        assert!(!b.strictly_contains(Coord { x: 0.0, y: 0.5 }));
        assert!(b.strictly_contains(Coord { x: 0.5, y: 0.5 }));
    }
}
