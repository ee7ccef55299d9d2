use std::path::Path;

use geo::Coord;

use crate::{
    boundary::StudyAreaSelection,
    config::{NorthArrowStyle, StudyAreaConfig},
    geom::{BoundingBox, Crs, Reprojector},
    render::{fetch_basemap, render, Basemap, Canvas, Color, Font, Graticule, Layer, Margins, Rendered, TileSource},
    PipelineError, Warning,
};

/// Dashed study-area grid.
const GRID_COLOR: Color = Color::rgb(0xb0, 0xb0, 0xb0);
const GRID_WIDTH: f64 = 0.5;
const BORDER_WIDTH: f64 = 1.5;

/// Basemap under the frame, or a warning if it cannot be fetched.
fn basemap_layer(
    basemap: &Basemap,
    tiles: Option<&dyn TileSource>,
    viewport: &BoundingBox,
    size: (u32, u32),
    max_tiles: usize,
) -> Option<Result<Layer, Warning>> {
    if *basemap == Basemap::None { return None }

    let Some(source) = tiles else {
        return Some(Err(Warning::decoration("basemap", format!("no tile source available for {basemap}"))))
    };
    Some(match fetch_basemap(source, viewport, size, max_tiles) {
        Ok(image) => Ok(Layer::Basemap(image)),
        Err(e) => {
            tracing::warn!("[maps::study_area] basemap {basemap} unavailable: {e:#}");
            Err(Warning::decoration("basemap", format!("{e:#}")))
        }
    })
}

/// North arrow from its PNG asset, or a warning if the asset cannot be read.
fn north_arrow_layer(style: &NorthArrowStyle) -> Option<Result<Layer, Warning>> {
    let path: &Path = style.path.as_deref()?;
    Some(match image::open(path) {
        Ok(image) => Ok(Layer::NorthArrow { image: image.to_rgba8(), position: style.position, zoom: style.zoom }),
        Err(e) => {
            tracing::warn!("[maps::study_area] north arrow {} unavailable: {e}", path.display());
            Err(Warning::decoration("north arrow", format!("{}: {e}", path.display())))
        }
    })
}

/// The detailed map: basemap, grid, site markers and labels, scale bar,
/// north arrow, degree ticks and border over the padded Web-Mercator extent.
pub fn study_area_map(
    selection: &StudyAreaSelection,
    config: &StudyAreaConfig,
    tiles: Option<&dyn TileSource>,
    max_tiles: usize,
    font: Option<&Font>,
) -> Result<Rendered, PipelineError> {
    let extent = selection.study_area_extent;
    let canvas = Canvas::new(config.figure, Margins::STUDY_AREA, extent);
    let graticule = Graticule::study_area(&extent).map_err(PipelineError::Geometry)?;

    let forward = Reprojector::new(Crs::Geographic, Crs::WebMercator).map_err(PipelineError::Geometry)?;
    let points = selection.sites.iter()
        .map(|site| forward.transform(site.coord()))
        .collect::<anyhow::Result<Vec<Coord<f64>>>>()
        .map_err(PipelineError::Geometry)?;
    let labels = selection.sites.iter().zip(&points).map(|(site, &p)| (p, site.name.clone())).collect();

    let mut layers = vec![
        Ok(Layer::GridLines { graticule: graticule.clone(), color: GRID_COLOR, width: GRID_WIDTH }),
        Ok(Layer::Markers { points, style: config.marker }),
        Ok(Layer::Labels { labels, style: config.label }),
        Ok(Layer::Ticks(graticule)),
        Ok(Layer::Border { width: BORDER_WIDTH }),
    ];
    if config.scale_bar.enabled {
        layers.push(Ok(Layer::ScaleBar(config.scale_bar)));
    }
    layers.extend(basemap_layer(&config.basemap, tiles, canvas.viewport(), canvas.frame_size(), max_tiles));
    layers.extend(north_arrow_layer(&config.north_arrow));

    let rendered = render(canvas, layers, font);
    tracing::info!("[maps::study_area] {} sites, {}x{} px", selection.sites.len(),
        rendered.view.image.width(), rendered.view.image.height());
    Ok(rendered)
}
