//! Latitude/longitude parsing from free-form text.

mod parse;

pub use parse::{parse_coordinate, parse_coordinate_str, CoordinateError};
