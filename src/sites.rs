use geo::{Coord, Point};

use crate::{coord::parse_coordinate, geom::Crs, table::{ResolvedColumns, Table}, PipelineError};

/// One validated input row.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub detected_state: Option<String>,
    pub detected_district: Option<String>,
}

impl SiteRecord {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), latitude, longitude, detected_state: None, detected_district: None }
    }

    /// Longitude/latitude as a geographic point.
    #[inline] pub fn point(&self) -> Point<f64> { Point::new(self.longitude, self.latitude) }

    #[inline] pub fn coord(&self) -> Coord<f64> { Coord { x: self.longitude, y: self.latitude } }
}

/// Convert every table row to a site. The first unparseable or out-of-range
/// coordinate rejects the whole import; rows are numbered from 1.
/// Latitudes are limited to what Web Mercator can project.
pub fn sites_from_table(table: &Table, columns: &ResolvedColumns) -> Result<Vec<SiteRecord>, PipelineError> {
    let index = |name: &str, role: &'static str| {
        table.column_index(name).ok_or(PipelineError::ColumnSelection { missing: vec![role] })
    };
    let (site, lat, lon) = (
        index(&columns.site, "site")?,
        index(&columns.lat, "latitude")?,
        index(&columns.lon, "longitude")?,
    );

    table.rows().iter().enumerate()
        .map(|(i, row)| {
            let coordinate = |col: usize, name: &str, limit: f64| {
                let cell = &row[col];
                parse_coordinate(cell)
                    .ok()
                    .filter(|value| value.abs() <= limit)
                    .ok_or_else(|| PipelineError::CoordinateParse {
                        row: i + 1,
                        column: name.to_string(),
                        value: cell.to_string(),
                    })
            };

            Ok(SiteRecord::new(
                row[site].to_string().trim(),
                coordinate(lat, &columns.lat, Crs::MAX_MERCATOR_LATITUDE)?,
                coordinate(lon, &columns.lon, 180.0)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn columns() -> ResolvedColumns {
        ResolvedColumns { site: "Site".into(), lat: "Lat".into(), lon: "Lon".into() }
    }

    fn table(rows: Vec<Vec<Cell>>) -> Table {
        Table::new(vec!["Site".into(), "Lat".into(), "Lon".into()], rows)
    }

    #[test]
    fn mixed_formats_become_sites() {
        let sites = sites_from_table(&table(vec![
            vec!["A".into(), 9.9732.into(), "76°16'56\"E".into()],
            vec![Cell::Number(2.0), "10.1S".into(), "-76.5".into()],
        ]), &columns()).unwrap();

        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "A");
        assert!((sites[0].longitude - (76.0 + 16.0 / 60.0 + 56.0 / 3600.0)).abs() < 1e-9);
        assert_eq!(sites[1].name, "2");
        assert_eq!(sites[1].latitude, -10.1);
        assert_eq!(sites[1].point(), Point::new(-76.5, -10.1));
    }

    #[test]
    fn malformed_value_rejects_import() {
        let err = sites_from_table(&table(vec![
            vec!["A".into(), 9.0.into(), 76.0.into()],
            vec!["B".into(), "abc".into(), 76.0.into()],
        ]), &columns()).unwrap_err();

        match err {
            PipelineError::CoordinateParse { row, column, value } => {
                assert_eq!((row, column.as_str(), value.as_str()), (2, "Lat", "abc"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = sites_from_table(&table(vec![vec!["A".into(), 9.0.into(), 181.0.into()]]), &columns()).unwrap_err();
        assert!(matches!(err, PipelineError::CoordinateParse { row: 1, .. }));
    }

    #[test]
    fn polar_latitudes_are_rejected() {
        for lat in [90.0, -90.0, 85.1] {
            let err = sites_from_table(&table(vec![
                vec!["A".into(), 9.0.into(), 76.0.into()],
                vec!["Pole".into(), Cell::Number(lat), 10.0.into()],
            ]), &columns()).unwrap_err();

            match err {
                PipelineError::CoordinateParse { row, column, .. } => assert_eq!((row, column.as_str()), (2, "Lat")),
                other => panic!("unexpected error for {lat}: {other:?}"),
            }
        }

        let sites = sites_from_table(&table(vec![vec!["North".into(), 85.0.into(), 10.0.into()]]), &columns()).unwrap();
        assert_eq!(sites[0].latitude, 85.0);
    }

    #[test]
    fn unknown_column_is_a_selection_error() {
        let columns = ResolvedColumns { lat: "Latitude".into(), ..columns() };
        let err = sites_from_table(&table(vec![]), &columns).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnSelection { ref missing } if missing == &["latitude"]));
    }
}
