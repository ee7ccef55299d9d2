use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};

use crate::geom::{BoundingBox, Crs};

/// A shape's bounding rectangle in the R-tree, pointing back at the shape by index.
#[derive(Debug, Clone)]
struct IndexedRect {
    idx: usize,
    rect: Rect<f64>,
}

impl RTreeObject for IndexedRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.rect.min().into(), self.rect.max().into())
    }
}

/// MultiPolygons in one CRS with an R-tree over their bounding rectangles.
#[derive(Debug, Clone)]
pub struct ShapeIndex {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<IndexedRect>,
    crs: Crs,
}

impl ShapeIndex {
    /// Index a list of MultiPolygons. Empty shapes are kept but never located.
    pub fn new(shapes: Vec<MultiPolygon<f64>>, crs: Crs) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(idx, shape)| shape.bounding_rect().map(|rect| IndexedRect { idx, rect }))
                    .collect()
            ),
            shapes,
            crs,
        }
    }

    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    #[inline] pub fn crs(&self) -> Crs { self.crs }

    /// Indices of shapes whose interior contains the point, in ascending order.
    /// Points exactly on a boundary are not contained.
    pub fn locate_all(&self, point: Point<f64>) -> Vec<usize> {
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point(point.into()))
            .filter(|entry| self.shapes[entry.idx].contains(&point))
            .map(|entry| entry.idx)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Lowest-indexed shape strictly containing the point.
    #[inline]
    pub fn locate(&self, point: Point<f64>) -> Option<usize> {
        self.locate_all(point).into_iter().next()
    }

    /// Bounding box of the selected shapes, or None if none of them have extent.
    pub fn bounds_of(&self, indices: impl IntoIterator<Item = usize>) -> Option<BoundingBox> {
        indices.into_iter()
            .filter_map(|idx| self.shapes.get(idx)?.bounding_rect())
            .map(|rect| BoundingBox::from_rect(rect, self.crs))
            .reduce(|a, b| a.union(&b).unwrap_or(a))
    }

    /// Bounding box of every shape.
    #[inline]
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds_of(0..self.shapes.len())
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

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
    fn locate_uses_strict_interior() {
        let index = ShapeIndex::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], Crs::Geographic);

        assert_eq!(index.locate(Point::new(0.5, 0.5)), Some(0));
        assert_eq!(index.locate(Point::new(1.5, 0.5)), Some(1));
        assert_eq!(index.locate(Point::new(1.0, 0.5)), None);
        assert_eq!(index.locate(Point::new(3.0, 3.0)), None);
    }

    #[test]
    fn overlapping_shapes_resolve_to_first() {
        let index = ShapeIndex::new(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)], Crs::Geographic);
        assert_eq!(index.locate_all(Point::new(1.5, 1.5)), vec![0, 1]);
        assert_eq!(index.locate(Point::new(1.5, 1.5)), Some(0));
    }

    #[test]
    fn bounds_cover_selected_shapes() {
        let index = ShapeIndex::new(
            vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0), MultiPolygon(vec![])],
            Crs::Geographic,
        );

        assert_eq!(index.bounds_of([1]), Some(BoundingBox::new(5.0, 5.0, 6.0, 6.0, Crs::Geographic)));
        assert_eq!(index.bounds(), Some(BoundingBox::new(0.0, 0.0, 6.0, 6.0, Crs::Geographic)));
        assert_eq!(index.bounds_of([2]), None);
    }
}
