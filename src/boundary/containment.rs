use std::collections::{BTreeMap, BTreeSet};

use crate::{
    boundary::Boundaries,
    geom::{padded_extent, BoundingBox},
    sites::SiteRecord,
    PipelineError, Warning,
};

/// Validated sites with their administrative context.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyAreaSelection {
    pub sites: Vec<SiteRecord>,
    /// Most common state among the sites, if any site has one.
    pub detected_state: Option<String>,
    /// Distinct district names any site falls in.
    pub covered_districts: BTreeSet<String>,
    /// Padded Web-Mercator extent of the sites.
    pub study_area_extent: BoundingBox,
}

/// Most frequent value; ties go to the lexicographically smallest.
fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts.into_iter()
        .max_by(|(a, m), (b, n)| m.cmp(n).then(b.cmp(a)))
        .map(|(value, _)| value)
}

/// Assign each site to the state and district polygons whose interior contains it,
/// then derive the detected state, the covered districts and the study-area extent.
pub fn detect(
    mut sites: Vec<SiteRecord>,
    boundaries: &Boundaries,
    padding: f64,
) -> Result<(StudyAreaSelection, Vec<Warning>), PipelineError> {
    if sites.is_empty() {
        return Err(PipelineError::InputFormat("the table has no data rows".into()))
    }

    let mut warnings = Vec::new();
    for site in &mut sites {
        site.detected_state = boundaries.states().locate(site.point()).map(|b| b.name.to_string());
        site.detected_district = boundaries.districts().locate(site.point()).map(|b| b.name.to_string());

        if site.detected_state.is_none() || site.detected_district.is_none() {
            tracing::debug!("[containment] {} at ({}, {}) matched state={:?} district={:?}",
                site.name, site.latitude, site.longitude, site.detected_state, site.detected_district);
            warnings.push(Warning::ContainmentMiss { site: site.name.clone() });
        }
    }

    let detected_state = mode(sites.iter().filter_map(|s| s.detected_state.as_deref())).map(str::to_string);
    let covered_districts: BTreeSet<String> = sites.iter()
        .filter_map(|s| s.detected_district.clone())
        .collect();

    if detected_state.is_none() {
        warnings.push(Warning::NoDetectedState);
    } else if covered_districts.is_empty() {
        warnings.push(Warning::NoDetectedDistrict);
    }

    let coords: Vec<_> = sites.iter().map(SiteRecord::coord).collect();
    let study_area_extent = padded_extent(&coords, padding).map_err(PipelineError::Geometry)?;

    tracing::info!("[containment] detected state {:?}, districts {:?}", detected_state, covered_districts);
    Ok((StudyAreaSelection { sites, detected_state, covered_districts, study_area_extent }, warnings))
}
