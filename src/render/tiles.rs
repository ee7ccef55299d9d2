//! XYZ basemap tiles: provider choice, zoom selection and mosaicking.

use std::{fmt, str::FromStr};

use anyhow::{bail, ensure, Context, Result};
use image::{imageops::{self, FilterType}, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::geom::{BoundingBox, Crs};

/// Half the side of the Web-Mercator world square, in meters.
const WORLD_HALF: f64 = 20_037_508.342_789_244;
const MAX_ZOOM: u8 = 19;

/// Basemap provider for the study-area map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Basemap {
    None,
    #[serde(alias = "osm")]
    OpenStreetMap,
    #[serde(alias = "positron")]
    CartoPositron,
    #[serde(alias = "esri-topo")]
    EsriWorldTopo,
    #[serde(alias = "esri-street")]
    EsriWorldStreet,
    /// A URL template with `{z}`, `{x}` and `{y}` placeholders.
    Custom(String),
}

impl Basemap {
    pub fn url_template(&self) -> Option<&str> {
        match self {
            Basemap::None => None,
            Basemap::OpenStreetMap => Some("https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
            Basemap::CartoPositron => Some("https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png"),
            Basemap::EsriWorldTopo => Some("https://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{z}/{y}/{x}"),
            Basemap::EsriWorldStreet => Some("https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}"),
            Basemap::Custom(template) => Some(template.as_str()),
        }
    }
}

impl fmt::Display for Basemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basemap::None => f.write_str("none"),
            Basemap::OpenStreetMap => f.write_str("osm"),
            Basemap::CartoPositron => f.write_str("positron"),
            Basemap::EsriWorldTopo => f.write_str("esri-topo"),
            Basemap::EsriWorldStreet => f.write_str("esri-street"),
            Basemap::Custom(template) => f.write_str(template),
        }
    }
}

impl FromStr for Basemap {
    type Err = anyhow::Error;

    /// Short names, or any URL containing `{z}`, `{x}` and `{y}`.
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Basemap::None,
            "osm" | "openstreetmap" => Basemap::OpenStreetMap,
            "positron" | "carto-positron" => Basemap::CartoPositron,
            "esri-topo" | "esri-world-topo" => Basemap::EsriWorldTopo,
            "esri-street" | "esri-world-street" => Basemap::EsriWorldStreet,
            _ if ["{z}", "{x}", "{y}"].iter().all(|p| s.contains(p)) => Basemap::Custom(s.trim().to_string()),
            _ => bail!("unknown basemap {s:?}; use osm, positron, esri-topo, esri-street, none or an XYZ URL template"),
        })
    }
}

/// Anything that can produce a raster tile for z/x/y.
pub trait TileSource {
    fn tile(&self, z: u8, x: u32, y: u32) -> Result<RgbaImage>;

    /// Tile side in pixels.
    fn tile_size(&self) -> u32 { 256 }
}

/// Tiles fetched over HTTP from a URL template.
#[cfg(feature = "tiles")]
pub struct XyzTiles {
    template: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "tiles")]
impl XyzTiles {
    pub fn new(template: &str, config: &crate::config::TileConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { template: template.to_string(), client })
    }

    fn url(&self, z: u8, x: u32, y: u32) -> String {
        self.template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[cfg(feature = "tiles")]
impl TileSource for XyzTiles {
    fn tile(&self, z: u8, x: u32, y: u32) -> Result<RgbaImage> {
        let url = self.url(z, x, y);
        let bytes = self.client.get(&url)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned error status"))?
            .bytes()
            .with_context(|| format!("read {url}"))?;

        Ok(image::load_from_memory(&bytes)
            .with_context(|| format!("decode tile {z}/{x}/{y}"))?
            .to_rgba8())
    }
}

/// Inclusive tile index range covering a Web-Mercator box at a zoom level.
fn tile_range(viewport: &BoundingBox, z: u8) -> ((u32, u32), (u32, u32)) {
    let n = (1u64 << z) as f64;
    let index = |t: f64| (t * n).floor().clamp(0.0, n - 1.0) as u32;
    let column = |x: f64| index((x + WORLD_HALF) / (2.0 * WORLD_HALF));
    let row = |y: f64| index((WORLD_HALF - y) / (2.0 * WORLD_HALF));

    ((column(viewport.min_x), column(viewport.max_x)), (row(viewport.max_y), row(viewport.min_y)))
}

#[inline]
fn tile_count(range: ((u32, u32), (u32, u32))) -> usize {
    let ((x0, x1), (y0, y1)) = range;
    (x1 - x0 + 1) as usize * (y1 - y0 + 1) as usize
}

/// Lowest zoom whose resolution matches the output, lowered until at most
/// `max_tiles` tiles are needed.
pub fn choose_zoom(viewport: &BoundingBox, width_px: u32, tile_size: u32, max_tiles: usize) -> u8 {
    let needed = viewport.width() / width_px.max(1) as f64;
    let ideal = (2.0 * WORLD_HALF / (tile_size as f64 * needed)).log2().ceil();
    let mut z = if ideal.is_finite() { ideal.clamp(0.0, MAX_ZOOM as f64) as u8 } else { 0 };

    while z > 0 && tile_count(tile_range(viewport, z)) > max_tiles.max(1) {
        z -= 1;
    }
    z
}

/// Fetch, stitch and crop the tiles under a Web-Mercator viewport, resized to `size`.
pub fn fetch_basemap(source: &dyn TileSource, viewport: &BoundingBox, size: (u32, u32), max_tiles: usize) -> Result<RgbaImage> {
    ensure!(viewport.crs == Crs::WebMercator, "[render::tiles] basemaps need an EPSG:3857 viewport, got {}", viewport.crs);
    ensure!(viewport.width() > 0.0 && viewport.height() > 0.0, "[render::tiles] empty viewport");

    let tile = source.tile_size();
    let z = choose_zoom(viewport, size.0, tile, max_tiles);
    let range @ ((x0, x1), (y0, y1)) = tile_range(viewport, z);
    tracing::debug!("[render::tiles] zoom {z}, {} tiles", tile_count(range));

    let mut mosaic = RgbaImage::new((x1 - x0 + 1) * tile, (y1 - y0 + 1) * tile);
    for ty in y0..=y1 {
        for tx in x0..=x1 {
            let mut image = source.tile(z, tx, ty)?;
            if image.dimensions() != (tile, tile) {
                image = imageops::resize(&image, tile, tile, FilterType::Triangle);
            }
            imageops::replace(&mut mosaic, &image, ((tx - x0) * tile) as i64, ((ty - y0) * tile) as i64);
        }
    }

    // Meters per mosaic pixel and the mosaic's top-left corner.
    let resolution = 2.0 * WORLD_HALF / ((1u64 << z) as f64 * tile as f64);
    let left = -WORLD_HALF + x0 as f64 * tile as f64 * resolution;
    let top = WORLD_HALF - y0 as f64 * tile as f64 * resolution;

    let crop_x = ((viewport.min_x - left) / resolution).round().max(0.0) as u32;
    let crop_y = ((top - viewport.max_y) / resolution).round().max(0.0) as u32;
    let crop_w = ((viewport.width() / resolution).round() as u32).clamp(1, mosaic.width().saturating_sub(crop_x).max(1));
    let crop_h = ((viewport.height() / resolution).round() as u32).clamp(1, mosaic.height().saturating_sub(crop_y).max(1));

    let cropped = imageops::crop_imm(&mosaic, crop_x, crop_y, crop_w, crop_h).to_image();
    Ok(imageops::resize(&cropped, size.0, size.1, FilterType::Lanczos3))
}
