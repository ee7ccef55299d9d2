use crate::PipelineError;

/// Header keyword sets used to recognize column roles.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSets {
    pub site: &'static [&'static str],
    pub lat: &'static [&'static str],
    pub lon: &'static [&'static str],
}

/// Keyword sets, version 1. Entries are compared against normalized headers.
pub const KEYWORDS_V1: KeywordSets = KeywordSets {
    site: &["site", "sitename", "station", "location", "place", "sampleid", "name", "point"],
    lat: &["lat", "latitude", "y"],
    lon: &["lon", "lng", "long", "longitude", "x"],
};

/// Column roles as far as they could be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    pub site: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// A complete column selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub site: String,
    pub lat: String,
    pub lon: String,
}

impl ColumnSelection {
    /// Replace individual roles with explicit user choices.
    pub fn with_overrides(self, site: Option<String>, lat: Option<String>, lon: Option<String>) -> Self {
        Self {
            site: site.or(self.site),
            lat: lat.or(self.lat),
            lon: lon.or(self.lon),
        }
    }

    /// Demand all three roles, naming the missing ones otherwise.
    pub fn require(self) -> Result<ResolvedColumns, PipelineError> {
        match (self.site, self.lat, self.lon) {
            (Some(site), Some(lat), Some(lon)) => Ok(ResolvedColumns { site, lat, lon }),
            (site, lat, lon) => Err(PipelineError::ColumnSelection {
                missing: [("site", site.is_none()), ("latitude", lat.is_none()), ("longitude", lon.is_none())]
                    .into_iter()
                    .filter_map(|(role, missing)| missing.then_some(role))
                    .collect(),
            }),
        }
    }
}

/// Lowercase, trim, and drop spaces and underscores.
fn normalize(header: &str) -> String {
    header.trim()
        .chars()
        .filter(|&c| c != ' ' && c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// First header (in header order) whose normalized form is in `keywords`.
fn match_keywords(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers.iter().position(|header| keywords.contains(&normalize(header).as_str()))
}

/// A site-column strategy: given headers and resolved lat/lon positions, maybe pick a column.
type SiteStrategy = fn(&[String], Option<usize>, Option<usize>, &KeywordSets) -> Option<usize>;

fn site_keyword(headers: &[String], _: Option<usize>, _: Option<usize>, keywords: &KeywordSets) -> Option<usize> {
    match_keywords(headers, keywords.site)
}

fn left_of_lat(_: &[String], lat: Option<usize>, _: Option<usize>, _: &KeywordSets) -> Option<usize> {
    lat?.checked_sub(1)
}

fn left_of_lon(_: &[String], _: Option<usize>, lon: Option<usize>, _: &KeywordSets) -> Option<usize> {
    lon?.checked_sub(1)
}

fn right_of_lat(_: &[String], lat: Option<usize>, _: Option<usize>, _: &KeywordSets) -> Option<usize> {
    lat.map(|i| i + 1)
}

fn right_of_lon(_: &[String], _: Option<usize>, lon: Option<usize>, _: &KeywordSets) -> Option<usize> {
    lon.map(|i| i + 1)
}

/// Site strategies in priority order.
const SITE_STRATEGIES: [SiteStrategy; 5] = [site_keyword, left_of_lat, left_of_lon, right_of_lat, right_of_lon];

/// Identify site name, latitude and longitude columns from header text.
pub fn resolve_columns(headers: &[String], keywords: &KeywordSets) -> ColumnSelection {
    let lat = match_keywords(headers, keywords.lat);
    let lon = match_keywords(headers, keywords.lon);

    // A coordinate column is never a site-name candidate.
    let site = SITE_STRATEGIES.iter()
        .filter_map(|strategy| strategy(headers, lat, lon, keywords))
        .find(|&i| i < headers.len() && Some(i) != lat && Some(i) != lon);

    let name = |i: Option<usize>| i.map(|i| headers[i].clone());
    ColumnSelection { site: name(site), lat: name(lat), lon: name(lon) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(names: &[&str]) -> ColumnSelection {
        resolve_columns(&headers(names), &KEYWORDS_V1)
    }

    #[test]
    fn site_falls_back_to_left_of_latitude() {
        let cols = resolve(&["SiteID", "Lat", "Long"]);
        assert_eq!(cols.site.as_deref(), Some("SiteID"));
        assert_eq!(cols.lat.as_deref(), Some("Lat"));
        assert_eq!(cols.lon.as_deref(), Some("Long"));

        let cols = resolve(&["A", "Latitude", "Longitude"]);
        assert_eq!(cols.site.as_deref(), Some("A"));
    }

    #[test]
    fn keyword_match_ignores_case_spaces_and_underscores() {
        let cols = resolve(&["id", "Sample_ID", " LATITUDE ", "long itude"]);
        assert_eq!(cols.site.as_deref(), Some("Sample_ID"));
        assert_eq!(cols.lat.as_deref(), Some(" LATITUDE "));
        assert_eq!(cols.lon.as_deref(), Some("long itude"));
    }

    #[test]
    fn first_header_wins_when_several_match() {
        let cols = resolve(&["name", "y", "Latitude", "x", "Longitude"]);
        assert_eq!(cols.lat.as_deref(), Some("y"));
        assert_eq!(cols.lon.as_deref(), Some("x"));
        assert_eq!(cols.site.as_deref(), Some("name"));
    }

    #[test]
    fn positional_fallback_skips_coordinate_columns() {
        // Left of lat is the lon column, so the right-of-lat column is used.
        let cols = resolve(&["Lon", "Lat", "Label"]);
        assert_eq!(cols.site.as_deref(), Some("Label"));

        // Lat first: nothing left of it, left of lon is lat, right of lat is lon.
        let cols = resolve(&["Lat", "Lon", "Code"]);
        assert_eq!(cols.site.as_deref(), Some("Code"));
    }

    #[test]
    fn missing_roles_require_manual_selection() {
        let cols = resolve(&["Easting", "Northing"]);
        assert_eq!(cols, ColumnSelection::default());

        match cols.require() {
            Err(PipelineError::ColumnSelection { missing }) => {
                assert_eq!(missing, vec!["site", "latitude", "longitude"]);
            }
            other => panic!("expected a column selection error, got {other:?}"),
        }
    }

    #[test]
    fn overrides_fill_and_replace_roles() {
        let cols = resolve(&["Easting", "Lat", "Lon"])
            .with_overrides(None, None, Some("Easting".into()));
        assert_eq!(cols.site.as_deref(), Some("Easting"));
        assert_eq!(cols.lon.as_deref(), Some("Easting"));

        let resolved = resolve(&["Station", "Northing", "Easting"])
            .with_overrides(None, Some("Northing".into()), Some("Easting".into()))
            .require()
            .unwrap();
        assert_eq!(resolved, ResolvedColumns {
            site: "Station".into(),
            lat: "Northing".into(),
            lon: "Easting".into(),
        });
    }
}
