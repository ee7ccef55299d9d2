//! Raster rendering: canvases, layers, text, graticules and basemap tiles.

mod canvas;
mod color;
pub(crate) mod draw;
mod graticule;
mod layer;
mod text;
mod tiles;

pub use canvas::{encode_png, Canvas, MapView, Margins};
pub use color::{Color, ColorError};
pub use graticule::{Graticule, Sides, Tick, TickStyle};
pub use layer::{render, Layer, LineStyle, PolygonStyle, Rendered};
pub use text::Font;
pub use tiles::{choose_zoom, fetch_basemap, Basemap, TileSource};
#[cfg(feature = "tiles")]
pub use tiles::XyzTiles;
