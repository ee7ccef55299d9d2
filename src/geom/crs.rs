use std::fmt;

use serde::{Deserialize, Serialize};

/// The two coordinate reference systems the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326, WGS84 longitude/latitude in degrees.
    #[serde(rename = "EPSG:4326")]
    Geographic,
    /// EPSG:3857, spherical (web) Mercator in meters.
    #[serde(rename = "EPSG:3857")]
    WebMercator,
}

impl Crs {
    /// Latitude limit of the Web-Mercator square; the poles do not project.
    pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

    #[inline]
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Geographic => 4326,
            Crs::WebMercator => 3857,
        }
    }

    #[inline] pub fn is_geographic(&self) -> bool { matches!(self, Crs::Geographic) }

    /// PROJ.4 definition understood by proj4rs.
    pub(crate) fn proj4(&self) -> &'static str {
        match self {
            Crs::Geographic => "+proj=longlat +datum=WGS84 +no_defs +type=crs",
            Crs::WebMercator => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +no_defs +type=crs",
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}
