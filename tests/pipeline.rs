// End-to-end runs over in-memory boundaries: table -> sites -> containment -> maps -> composite

use std::sync::Arc;

use geo::{polygon, MultiPolygon};
use papermap::{
    boundary::{AdminLevel, Boundaries, BoundaryLayer},
    compose::CompositeLayout,
    config::{FigureConfig, NorthArrowStyle},
    read_table_from_bytes, resolve_columns,
    render::Basemap,
    table::Cell,
    MapConfig, Pipeline, PipelineError, ResolvedColumns, Table, Warning, KEYWORDS_V1,
};

fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![(x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size)]])
}

fn boundaries() -> Arc<Boundaries> {
    let states = BoundaryLayer::new(AdminLevel::State, vec![
        ("KERALA".into(), None, square(76.0, 9.0, 1.5)),
        ("TAMIL NADU".into(), None, square(77.5, 9.0, 1.5)),
    ]);
    let districts = BoundaryLayer::new(AdminLevel::District, vec![
        ("Ernakulam".into(), Some("KERALA".into()), square(76.0, 9.5, 0.5)),
        ("Idukki".into(), Some("KERALA".into()), square(76.5, 9.5, 0.5)),
        ("Madurai".into(), Some("TAMIL NADU".into()), square(77.5, 9.5, 0.5)),
    ]);
    Arc::new(Boundaries::new(states, districts).unwrap())
}

/// Small figures, no network, no assets, no text.
fn offline_config() -> MapConfig {
    let mut config = MapConfig { draw_text: false, ..MapConfig::default() };
    config.study_area.figure = FigureConfig { size_inches: 4.0, dpi: 100 };
    config.study_area.basemap = Basemap::None;
    config.study_area.north_arrow = NorthArrowStyle { path: None, ..NorthArrowStyle::default() };
    config.overview.figure = FigureConfig { size_inches: 3.0, dpi: 100 };
    config
}

fn table(rows: &[(&str, Cell, Cell)]) -> Table {
    Table::new(
        vec!["Site".into(), "Latitude".into(), "Longitude".into()],
        rows.iter().map(|(name, lat, lon)| vec![Cell::from(*name), lat.clone(), lon.clone()]).collect(),
    )
}

fn columns() -> ResolvedColumns {
    ResolvedColumns { site: "Site".into(), lat: "Latitude".into(), lon: "Longitude".into() }
}

#[test]
fn three_sites_in_one_district_compose_four_maps() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    let sites = table(&[
        ("Aluva", 9.75.into(), 76.20.into()),
        ("Kalamassery", 9.80.into(), 76.25.into()),
        ("Edappally", Cell::from("9°52'N"), Cell::from("76°18'E")),
    ]);

    let output = pipeline.run(&sites, &columns()).unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    assert_eq!(output.selection.detected_state.as_deref(), Some("KERALA"));
    assert_eq!(output.selection.covered_districts.iter().collect::<Vec<_>>(), ["Ernakulam"]);

    let maps = output.maps();
    let names: Vec<_> = maps.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, ["country_map", "state_map", "district_map", "study_area_map"]);

    let composite = output.compose(&pipeline.config().composite).unwrap();
    let [country, state, district, study] = [maps[0].1, maps[1].1, maps[2].1, maps[3].1].map(|v| v.image.dimensions());
    let layout = CompositeLayout::new([country, state, district], study, &pipeline.config().composite);
    assert_eq!(composite.dimensions(), (layout.width, layout.height));
    assert_eq!(layout.width, 300 + layout.right.0);
}

#[test]
fn padded_extent_contains_every_site() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    let sites = table(&[("A", 9.6.into(), 76.1.into()), ("B", 9.9.into(), 76.4.into())]);

    let output = pipeline.run(&sites, &columns()).unwrap();
    let extent = output.selection.study_area_extent;
    let geographic = extent.to_crs(papermap::geom::Crs::Geographic).unwrap();
    for site in &output.selection.sites {
        assert!(geographic.strictly_contains(site.coord()), "{site:?} outside {geographic:?}");
    }
    assert_eq!(output.study_area.bbox, extent);
}

#[test]
fn malformed_coordinate_rejects_the_import() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    let sites = table(&[("A", 9.75.into(), 76.2.into()), ("B", Cell::from("abc"), 76.3.into())]);

    match pipeline.run(&sites, &columns()) {
        Err(PipelineError::CoordinateParse { row, column, value }) => {
            assert_eq!((row, column.as_str(), value.as_str()), (2, "Latitude", "abc"));
        }
        other => panic!("expected a coordinate error, got {other:?}"),
    }
}

#[test]
fn sites_outside_every_state_still_render_the_study_area() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    let sites = table(&[("Colombo", 6.93.into(), 79.85.into())]);

    let output = pipeline.run(&sites, &columns()).unwrap();
    assert_eq!(output.warnings, vec![Warning::ContainmentMiss { site: "Colombo".into() }, Warning::NoDetectedState]);
    assert!(output.overviews.is_none());
    assert_eq!(output.maps().len(), 1);

    match output.compose(&pipeline.config().composite) {
        Err(PipelineError::CompositionIncomplete { missing }) => {
            assert_eq!(missing, ["country map", "state map", "district map"]);
        }
        other => panic!("expected an incomplete composition, got {other:?}"),
    }
}

#[test]
fn site_outside_every_district_keeps_the_district_map() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    let sites = table(&[
        ("A", 9.6.into(), 76.1.into()),
        ("B", 9.7.into(), 76.2.into()),
        ("C", 9.2.into(), 77.7.into()),
    ]);

    let output = pipeline.run(&sites, &columns()).unwrap();
    assert_eq!(output.selection.detected_state.as_deref(), Some("KERALA"));
    assert_eq!(output.warnings, vec![Warning::ContainmentMiss { site: "C".into() }]);

    let overviews = output.overviews.as_ref().unwrap();
    assert!(overviews.district.is_some());
    assert_eq!(output.maps().len(), 4);
}

#[test]
fn district_in_another_state_skips_the_district_map() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    let sites = table(&[
        ("Aluva", 9.75.into(), 76.2.into()),
        ("B", 9.2.into(), 77.7.into()),
        ("C", 9.3.into(), 77.8.into()),
    ]);

    let output = pipeline.run(&sites, &columns()).unwrap();
    assert_eq!(output.selection.detected_state.as_deref(), Some("TAMIL NADU"));
    assert_eq!(output.selection.covered_districts.iter().collect::<Vec<_>>(), ["Ernakulam"]);
    assert!(output.warnings.contains(&Warning::NoDetectedDistrict), "{:?}", output.warnings);

    let overviews = output.overviews.as_ref().unwrap();
    assert!(overviews.district.is_none());
    assert_eq!(output.maps().len(), 3);

    match output.compose(&pipeline.config().composite) {
        Err(PipelineError::CompositionIncomplete { missing }) => assert_eq!(missing, ["district map"]),
        other => panic!("expected an incomplete composition, got {other:?}"),
    }
}

#[test]
fn polar_latitude_rejects_the_import() {
    let pipeline = Pipeline::new(boundaries(), offline_config());
    for lat in [90.0, -90.0] {
        let sites = table(&[("A", 9.75.into(), 76.2.into()), ("Pole", lat.into(), 76.3.into())]);
        match pipeline.run(&sites, &columns()) {
            Err(PipelineError::CoordinateParse { row, column, .. }) => assert_eq!((row, column.as_str()), (2, "Latitude")),
            other => panic!("expected a coordinate error for {lat}, got {other:?}"),
        }
    }
}

#[test]
fn csv_upload_resolves_columns_and_runs() {
    let csv = "SiteID,Lat,Long\nS1,9.70N,76.10E\nS2,9.72,76.12\nS3,9.74,76.14\n";
    let table = read_table_from_bytes("sites.csv", csv.as_bytes().to_vec()).unwrap();
    let columns = resolve_columns(table.headers(), &KEYWORDS_V1).require().unwrap();
    assert_eq!(columns, ResolvedColumns { site: "SiteID".into(), lat: "Lat".into(), lon: "Long".into() });

    let output = Pipeline::new(boundaries(), offline_config()).run(&table, &columns).unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    assert_eq!(output.selection.sites[0].latitude, 9.70);
    assert_eq!(output.maps().len(), 4);
}

#[test]
fn unsupported_upload_is_an_input_error() {
    assert!(matches!(read_table_from_bytes("sites.pdf", b"%PDF".to_vec()), Err(PipelineError::InputFormat(_))));
}
