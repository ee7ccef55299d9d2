use anyhow::{ensure, Result};
use geo::Coord;

use crate::geom::{BoundingBox, Crs, Reprojector};

/// Fraction of each axis span added on every side of the study area.
pub const STUDY_AREA_PADDING: f64 = 0.15;

/// Fraction of the square span added on every side of an overview viewport.
pub const OVERVIEW_BUFFER: f64 = 0.05;

/// Smallest axis span used for degenerate extents, in the CRS's linear unit.
#[inline]
fn minimum_span(crs: Crs) -> f64 {
    match crs {
        Crs::WebMercator => 1_000.0,
        Crs::Geographic => 0.01,
    }
}

/// Widen `[lo, hi]` around its midpoint to at least `min`.
#[inline]
fn widen(lo: f64, hi: f64, min: f64) -> (f64, f64) {
    if hi - lo >= min { return (lo, hi) }
    let mid = (lo + hi) / 2.0;
    (mid - min / 2.0, mid + min / 2.0)
}

/// Web-Mercator extent of geographic points, padded by `ratio` of each axis span
/// on every side. A degenerate axis is widened to 1 km first, so the result
/// strictly contains every point.
pub fn padded_extent(points: &[Coord<f64>], ratio: f64) -> Result<BoundingBox> {
    ensure!(!points.is_empty(), "[geom::extent] cannot compute the extent of zero points");
    ensure!(ratio >= 0.0, "[geom::extent] padding ratio must be non-negative, got {ratio}");

    let reprojector = Reprojector::new(Crs::Geographic, Crs::WebMercator)?;
    let projected = points.iter()
        .map(|&point| reprojector.transform(point))
        .collect::<Result<Vec<_>>>()?;

    let bounds = BoundingBox::from_coords(projected, Crs::WebMercator)
        .ok_or_else(|| anyhow::anyhow!("[geom::extent] no projected points"))?;

    let min = minimum_span(Crs::WebMercator);
    let (min_x, max_x) = widen(bounds.min_x, bounds.max_x, min);
    let (min_y, max_y) = widen(bounds.min_y, bounds.max_y, min);
    let (pad_x, pad_y) = ((max_x - min_x) * ratio, (max_y - min_y) * ratio);

    Ok(BoundingBox::new(min_x - pad_x, min_y - pad_y, max_x + pad_x, max_y + pad_y, Crs::WebMercator))
}

/// Square box centered on `bbox`, with side `max(width, height)` inflated by
/// `ratio` of that side on every side. Zero-size input uses a minimal span.
pub fn square_bounds_with_buffer(bbox: &BoundingBox, ratio: f64) -> BoundingBox {
    let span = bbox.width().max(bbox.height());
    let span = if span > 0.0 { span } else { minimum_span(bbox.crs) };
    let half = span / 2.0 + span * ratio;
    let center = bbox.center();

    BoundingBox::new(center.x - half, center.y - half, center.x + half, center.y + half, bbox.crs)
}
