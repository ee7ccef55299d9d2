use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::{
    boundary::{detect, Boundaries, StudyAreaSelection},
    compose::compose,
    config::{CompositeConfig, MapConfig},
    maps,
    render::{Font, MapView, TileSource},
    sites::sites_from_table,
    table::{ResolvedColumns, Table},
    PipelineError, Warning,
};

/// The locator maps, present when a state was detected.
#[derive(Debug, Clone)]
pub struct Overviews {
    pub country: MapView,
    pub state: MapView,
    /// Present when a covered district belongs to the detected state.
    pub district: Option<MapView>,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub selection: StudyAreaSelection,
    pub study_area: MapView,
    pub overviews: Option<Overviews>,
    pub warnings: Vec<Warning>,
}

impl PipelineOutput {
    /// Rendered maps by output name, in a stable order.
    pub fn maps(&self) -> Vec<(&'static str, &MapView)> {
        let mut maps = Vec::with_capacity(4);
        if let Some(overviews) = &self.overviews {
            maps.push(("country_map", &overviews.country));
            maps.push(("state_map", &overviews.state));
            if let Some(district) = &overviews.district {
                maps.push(("district_map", district));
            }
        }
        maps.push(("study_area_map", &self.study_area));
        maps
    }

    /// The two-column poster; refused when an overview is missing.
    pub fn compose(&self, config: &CompositeConfig) -> Result<RgbaImage, PipelineError> {
        let overviews = self.overviews.as_ref();
        compose(
            [
                overviews.map(|o| &o.country.image),
                overviews.map(|o| &o.state.image),
                overviews.and_then(|o| o.district.as_ref()).map(|d| &d.image),
            ],
            Some(&self.study_area.image),
            config,
        )
    }
}

/// Boundary data, styling, tile source and font shared by every run.
pub struct Pipeline {
    boundaries: Arc<Boundaries>,
    config: MapConfig,
    tiles: Option<Box<dyn TileSource>>,
    font: Option<Font>,
    /// Why text cannot be drawn, reported on every run.
    font_warning: Option<Warning>,
}

impl Pipeline {
    /// Set up a pipeline over loaded boundaries. The configured basemap gets an
    /// HTTP tile source when the `tiles` feature is enabled.
    pub fn new(boundaries: Arc<Boundaries>, config: MapConfig) -> Self {
        let (font, font_warning) = match config.draw_text {
            false => (None, None),
            true => match Font::locate(config.font.as_deref()) {
                Ok(font) => (Some(font), None),
                Err(e) => {
                    tracing::warn!("[pipeline] text disabled: {e:#}");
                    (None, Some(Warning::decoration("text", format!("{e:#}"))))
                }
            },
        };

        let tiles = Self::default_tiles(&config);
        Self { boundaries, config, tiles, font, font_warning }
    }

    /// Load the configured boundary shapefiles and set up a pipeline.
    pub fn from_config(config: MapConfig) -> Result<Self> {
        let boundaries = Boundaries::load(&config.boundaries).context("[pipeline] failed to load boundaries")?;
        Ok(Self::new(Arc::new(boundaries), config))
    }

    #[cfg(feature = "tiles")]
    fn default_tiles(config: &MapConfig) -> Option<Box<dyn TileSource>> {
        let template = config.study_area.basemap.url_template()?;
        match crate::render::XyzTiles::new(template, &config.tiles) {
            Ok(tiles) => Some(Box::new(tiles)),
            Err(e) => {
                tracing::warn!("[pipeline] no tile client: {e:#}");
                None
            }
        }
    }

    #[cfg(not(feature = "tiles"))]
    fn default_tiles(_config: &MapConfig) -> Option<Box<dyn TileSource>> {
        None
    }

    /// Replace the tile source, e.g. with a local cache.
    pub fn with_tiles(mut self, tiles: Box<dyn TileSource>) -> Self {
        self.tiles = Some(tiles);
        self
    }

    #[inline] pub fn config(&self) -> &MapConfig { &self.config }

    #[inline] pub fn boundaries(&self) -> &Boundaries { &self.boundaries }

    /// Parse the sites, detect their administrative context and render all maps.
    /// Unparseable coordinates reject the run before anything is drawn.
    pub fn run(&self, table: &Table, columns: &ResolvedColumns) -> Result<PipelineOutput, PipelineError> {
        let sites = sites_from_table(table, columns)?;
        tracing::info!("[pipeline] {} sites from columns {:?}/{:?}/{:?}", sites.len(), columns.site, columns.lat, columns.lon);

        let (selection, mut warnings) = detect(sites, &self.boundaries, self.config.study_area.padding)?;
        warnings.extend(self.font_warning.clone());
        let font = self.font.as_ref();

        let study = maps::study_area_map(&selection, &self.config.study_area, self.tiles.as_deref(),
            self.config.tiles.max_tiles, font)?;
        warnings.extend(study.warnings);

        let overviews = match &selection.detected_state {
            None => None,
            Some(state) => {
                let overview = &self.config.overview;
                let country = maps::country_map(&self.boundaries, state, overview, font)?;
                let state_map = maps::state_map(&self.boundaries, state, &selection.covered_districts, overview, font)?;
                let district = maps::district_map(&self.boundaries, state, &selection.covered_districts,
                    &selection.study_area_extent, overview, font)?;

                if district.is_none() && !warnings.contains(&Warning::NoDetectedDistrict) {
                    warnings.push(Warning::NoDetectedDistrict);
                }
                for rendered in [Some(&country), Some(&state_map), district.as_ref()].into_iter().flatten() {
                    warnings.extend(rendered.warnings.iter().cloned());
                }

                Some(Overviews { country: country.view, state: state_map.view, district: district.map(|d| d.view) })
            }
        };

        for warning in &warnings {
            tracing::warn!("[pipeline] {warning}");
        }
        Ok(PipelineOutput { selection, study_area: study.view, overviews, warnings })
    }
}
