//! Two-column poster: the three overviews stacked on the left, the study-area map on the right.

use image::{imageops::{self, FilterType}, RgbaImage};

use crate::{config::CompositeConfig, render::Color, PipelineError};

const NAMES: [&str; 4] = ["country map", "state map", "district map", "study-area map"];

/// Where every source image lands on the composite canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    pub left_width: u32,
    /// Heights of the resized overviews, top to bottom.
    pub left_heights: [u32; 3],
    /// Top edges of the overviews.
    pub left_offsets: [u32; 3],
    /// Size of the resized study-area map.
    pub right: (u32, u32),
    pub width: u32,
    pub height: u32,
}

#[inline]
fn scaled_height(size: (u32, u32), width: u32) -> u32 {
    ((size.1 as f64 * width as f64 / size.0.max(1) as f64) as u32).max(1)
}

impl CompositeLayout {
    /// Overviews take the small width; the study-area map takes the big width
    /// unless the overview stack is taller, in which case it matches that height.
    /// The leftover height is split into equal gaps between the overviews.
    pub fn new(overviews: [(u32, u32); 3], study_area: (u32, u32), config: &CompositeConfig) -> Self {
        let left_width = config.small_width.max(1);
        let left_heights = overviews.map(|size| scaled_height(size, left_width));
        let left_total: u32 = left_heights.iter().sum();

        let aspect = study_area.1 as f64 / study_area.0.max(1) as f64;
        let mut right = (config.big_width.max(1), scaled_height(study_area, config.big_width.max(1)));
        if left_total > right.1 {
            right = (((left_total as f64 / aspect) as u32).max(1), left_total);
        }

        let height = left_total.max(right.1);
        let gap = (height - left_total) / 2;
        let left_offsets = [0, left_heights[0] + gap, left_heights[0] + left_heights[1] + 2 * gap];

        Self { left_width, left_heights, left_offsets, right, width: left_width + right.0, height }
    }
}

/// Stitch `[country, state, district]` and the study-area map into one image.
/// Every input is required.
pub fn compose(
    overviews: [Option<&RgbaImage>; 3],
    study_area: Option<&RgbaImage>,
    config: &CompositeConfig,
) -> Result<RgbaImage, PipelineError> {
    let inputs = [overviews[0], overviews[1], overviews[2], study_area];
    let missing: Vec<&'static str> = inputs.iter().zip(NAMES)
        .filter(|(image, _)| image.is_none())
        .map(|(_, name)| name)
        .collect();

    let ([Some(country), Some(state), Some(district)], Some(study_area)) = (overviews, study_area) else {
        return Err(PipelineError::CompositionIncomplete { missing })
    };

    let layout = CompositeLayout::new(
        [country.dimensions(), state.dimensions(), district.dimensions()],
        study_area.dimensions(),
        config,
    );
    tracing::debug!("[compose] {layout:?}");

    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, Color::WHITE.to_rgba());
    for ((image, height), top) in [country, state, district].into_iter().zip(layout.left_heights).zip(layout.left_offsets) {
        let resized = imageops::resize(image, layout.left_width, height, FilterType::Lanczos3);
        imageops::replace(&mut canvas, &resized, 0, top as i64);
    }
    let right = imageops::resize(study_area, layout.right.0, layout.right.1, FilterType::Lanczos3);
    imageops::replace(&mut canvas, &right, layout.left_width as i64, 0);

    Ok(canvas)
}
