//! The four figures: the study-area map and the country, state and district overviews.

mod overview;
mod study_area;

pub use overview::{country_map, district_map, state_map};
pub use study_area::study_area_map;
