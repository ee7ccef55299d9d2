//! CRS-tagged boxes, reprojection, extents and the polygon index.

mod bbox;
mod crs;
mod extent;
mod index;
mod proj;

pub use bbox::{BoundingBox, CrsMismatch};
pub use crs::Crs;
pub use extent::{padded_extent, square_bounds_with_buffer, OVERVIEW_BUFFER, STUDY_AREA_PADDING};
pub use index::ShapeIndex;
pub use proj::Reprojector;
