//! Administrative boundary layers and point-in-polygon assignment.

mod containment;
mod layer;
mod read;

pub use containment::{detect, StudyAreaSelection};
pub use layer::{AdminLevel, AdministrativeBoundary, Boundaries, BoundaryLayer};
pub use read::read_layer;
