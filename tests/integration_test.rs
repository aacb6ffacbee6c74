use aerocountry::attribution::find_country;
use aerocountry::cache::Provenance;
use aerocountry::config::{AggregationMethod, LevelRange, RunConfig, Season, Statistic};
use aerocountry::dataset::{FieldSource, NetCdfSource};
use aerocountry::errors::AeroCountryError;
use aerocountry::geometry::load_boundaries;
use aerocountry::metadata::list_species;
use aerocountry::netcdf_io::{CountryMaskWriter, NO_COUNTRY};
use aerocountry::pipeline::{analyse, country_mask, load_polygons};
use aerocountry::processing::ColourScale;
use netcdf::{create, open, AttributeValue};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::PolygonRing;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LONS: [f64; 4] = [1.0, 3.0, 5.0, 7.0];
const LATS: [f64; 2] = [41.0, 43.0];
const FILL: f64 = -999.0;

/// Westland covers lon 0..4, Eastland lon 4..8, both lat 40..44.
/// Tinyland is inside the frame but holds no cell centre, Farland is outside it.
const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"NAME_ENGL": "Westland"},
     "geometry": {"type": "Polygon", "coordinates": [[[0,40],[4,40],[4,44],[0,44],[0,40]]]}},
    {"type": "Feature", "properties": {"NAME_ENGL": "Eastland"},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[4,40],[8,40],[8,44],[4,44],[4,40]]]]}},
    {"type": "Feature", "properties": {"NAME_ENGL": "Tinyland"},
     "geometry": {"type": "Polygon", "coordinates": [[[10,50],[10.5,50],[10.5,50.5],[10,50.5],[10,50]]]}},
    {"type": "Feature", "properties": {"NAME_ENGL": "Farland"},
     "geometry": {"type": "Polygon", "coordinates": [[[100,0],[101,0],[101,1],[100,1],[100,0]]]}}
  ]
}"#;

fn is_west(lon_idx: usize) -> bool {
    lon_idx < 2
}

fn add_coordinate(file: &mut netcdf::FileMut, name: &str, values: &[f64]) {
    let mut var = file
        .add_variable::<f64>(name, &[name])
        .expect("Failed to add coordinate");
    var.put_values(values, ..).expect("Failed to write coordinate");
}

/// Emission `BC(time, lev, lat, lon)` on levels 1..=3
///
/// Levels 1 and 2 hold 1.0 over Westland and 2.0 over Eastland, level 3 holds
/// 100.0. One Westland value is the fill value.
fn write_emission(path: &Path) {
    let mut file = create(path).expect("Failed to create emission file");
    file.add_dimension("time", 2).unwrap();
    file.add_dimension("lev", 3).unwrap();
    file.add_dimension("lat", LATS.len()).unwrap();
    file.add_dimension("lon", LONS.len()).unwrap();
    add_coordinate(&mut file, "lev", &[1.0, 2.0, 3.0]);
    add_coordinate(&mut file, "lat", &LATS);
    add_coordinate(&mut file, "lon", &LONS);

    let mut values = Vec::new();
    for t in 0..2 {
        for lev in 0..3 {
            for lat in 0..LATS.len() {
                for lon in 0..LONS.len() {
                    let value = if lev == 2 {
                        100.0
                    } else if t == 1 && lev == 0 && lat == 0 && lon == 0 {
                        FILL
                    } else if is_west(lon) {
                        1.0
                    } else {
                        2.0
                    };
                    values.push(value);
                }
            }
        }
    }

    let mut var = file
        .add_variable::<f64>("BC", &["time", "lev", "lat", "lon"])
        .unwrap();
    var.put_attribute("_FillValue", FILL).unwrap();
    var.put_attribute("units", "kg m-2 s-1").unwrap();
    var.put_values(&values, ..).unwrap();
}

/// Pollution `AerMassBC(time, lev, lat, lon)` on levels 1 and 2
///
/// OFF is 1.0 everywhere; ON adds 0.5 (Westland) or 3.0 (Eastland) at level 1
/// and 99.0 at level 2.
fn write_pollution(path: &Path, aircraft_on: bool) {
    let mut file = create(path).expect("Failed to create pollution file");
    file.add_dimension("time", 2).unwrap();
    file.add_dimension("lev", 2).unwrap();
    file.add_dimension("lat", LATS.len()).unwrap();
    file.add_dimension("lon", LONS.len()).unwrap();
    add_coordinate(&mut file, "lev", &[1.0, 2.0]);
    add_coordinate(&mut file, "lat", &LATS);
    add_coordinate(&mut file, "lon", &LONS);

    let mut values = Vec::new();
    for _t in 0..2 {
        for lev in 0..2 {
            for _lat in 0..LATS.len() {
                for lon in 0..LONS.len() {
                    let extra = match (aircraft_on, lev, is_west(lon)) {
                        (false, _, _) => 0.0,
                        (true, 1, _) => 99.0,
                        (true, _, true) => 0.5,
                        (true, _, false) => 3.0,
                    };
                    values.push(1.0 + extra);
                }
            }
        }
    }

    let mut var = file
        .add_variable::<f64>("AerMassBC", &["time", "lev", "lat", "lon"])
        .unwrap();
    var.put_values(&values, ..).unwrap();
}

fn setup(root: &Path) -> RunConfig {
    let data_dir = root.join("Data");
    fs::create_dir_all(&data_dir).unwrap();

    let config = RunConfig {
        data_dir: data_dir.clone(),
        season: Season::Winter,
        emission_levels: LevelRange::new(1, 2).unwrap(),
        boundaries: root.join("countries.geojson"),
        country_list: root.join("countries.json"),
        cache_dir: Some(root.join("cache")),
        ..RunConfig::default()
    };

    write_emission(&config.emission_path());
    write_pollution(&config.pollution_path(true), true);
    write_pollution(&config.pollution_path(false), false);
    fs::write(&config.boundaries, BOUNDARIES).unwrap();
    fs::write(
        &config.country_list,
        r#"["Eastland", "Farland", "Tinyland", "Westland"]"#,
    )
    .unwrap();

    config
}

#[test]
fn test_netcdf_source_fields() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = setup(temp_dir.path());
    let fields = NetCdfSource::from_config(&config).load_fields().unwrap();

    assert_eq!(fields.lons, LONS.to_vec());
    assert_eq!(fields.lats, LATS.to_vec());
    assert_eq!(fields.emission.shape(), &[2, 4]);

    // 2 timesteps x 2 levels, one Westland value missing at (lat 0, lon 0)
    assert_eq!(fields.emission[[0, 0]], 3.0);
    assert_eq!(fields.emission[[1, 0]], 4.0);
    assert_eq!(fields.emission[[0, 3]], 8.0);

    // Ground level difference averaged over time
    assert!((fields.pollution[[0, 1]] - 0.5).abs() < 1e-12);
    assert!((fields.pollution[[1, 2]] - 3.0).abs() < 1e-12);
}

#[test]
fn test_emission_multiplier_and_missing_variable() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let mut config = setup(temp_dir.path());

    config.emission_multiplier = 1e3;
    let fields = NetCdfSource::from_config(&config).load_fields().unwrap();
    assert_eq!(fields.emission[[1, 3]], 8e3);

    config.emission_chemical = "SO2".to_string();
    let err = NetCdfSource::from_config(&config).load_fields().unwrap_err();
    assert!(err.to_string().contains("SO2"));
}

#[test]
fn test_shifted_pollution_off_grid_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = setup(temp_dir.path());

    {
        let mut off = netcdf::append(config.pollution_path(false)).unwrap();
        let shifted: Vec<f64> = LONS.iter().map(|lon| lon + 0.5).collect();
        off.variable_mut("lon")
            .unwrap()
            .put_values(&shifted, ..)
            .unwrap();
    }

    let err = NetCdfSource::from_config(&config).load_fields().unwrap_err();
    assert!(matches!(err, AeroCountryError::GridMismatch { .. }));
    assert!(err.to_string().contains("'lon'"));
}

#[test]
fn test_full_analysis_ratio() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = setup(temp_dir.path());
    let polygons = load_polygons(&config).unwrap();
    let names: Vec<&str> = polygons.names().collect();
    assert_eq!(names, vec!["Eastland", "Tinyland", "Westland"]);

    let source = NetCdfSource::from_config(&config);
    let report = analyse(&config, &polygons, &source).unwrap();

    assert_eq!(report.provenance, Provenance::Computed);
    assert_eq!(report.countries_total, 3);
    assert_eq!(report.unavailable, vec!["Tinyland"]);
    assert!(report.removed.is_empty());

    // Westland: pollution 4 x 0.5, emission 3 + 4 + 4 + 4
    assert!((report.values["Westland"] - 2.0 / 15.0).abs() < 1e-12);
    // Eastland: pollution 4 x 3.0, emission 4 x 8
    assert!((report.values["Eastland"] - 12.0 / 32.0).abs() < 1e-12);

    assert_eq!(report.normalised["Westland"], 0.0);
    assert_eq!(report.normalised["Eastland"], 1.0);

    let spatial = report.spatial.expect("two distinct values give spatial statistics");
    assert!((spatial.morans_i_global + 1.0).abs() < 1e-9);
    assert!((spatial.gearys_c - 1.0).abs() < 1e-9);
    assert_eq!(spatial.morans_i_local.len(), 2);

    let json_path = temp_dir.path().join("report.json");
    report_roundtrip_keys(&json_path, &config);
}

fn report_roundtrip_keys(json_path: &Path, config: &RunConfig) {
    let polygons = load_polygons(config).unwrap();
    let source = NetCdfSource::from_config(config);
    let report = analyse(config, &polygons, &source).unwrap();
    report.write_json(json_path).unwrap();

    let text = fs::read_to_string(json_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["title"], "Ground Pollution/Emission Ratio");
    assert_eq!(json["provenance"], "cached");
    assert!(json["values"]["Westland"].is_number());
    assert!(json["spatial"]["morans_i_local"]["Eastland"].is_number());
}

#[test]
fn test_cached_run_matches_computed_run() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = setup(temp_dir.path());
    let polygons = load_polygons(&config).unwrap();
    let source = NetCdfSource::from_config(&config);

    let computed = analyse(&config, &polygons, &source).unwrap();
    assert_eq!(computed.provenance, Provenance::Computed);
    assert!(config.cache_path().unwrap().exists());

    // The datasets are no longer needed once the cache exists
    fs::remove_file(config.emission_path()).unwrap();
    let cached = analyse(&config, &polygons, &source).unwrap();
    assert_eq!(cached.provenance, Provenance::Cached);
    assert_eq!(cached.values, computed.values);
    assert_eq!(cached.unavailable, computed.unavailable);

    // Forcing a recalculation needs the datasets again
    let recalculate = RunConfig {
        recalculate: true,
        ..config.clone()
    };
    assert!(analyse(&recalculate, &polygons, &source).is_err());
}

#[test]
fn test_statistics_and_outliers() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let base = RunConfig {
        cache_dir: None,
        ..setup(temp_dir.path())
    };
    let polygons = load_polygons(&base).unwrap();
    let source = NetCdfSource::from_config(&base);

    let pollution = RunConfig {
        statistic: Statistic::Pollution,
        method: AggregationMethod::Median,
        colour_scale: ColourScale::Sqrt,
        ..base.clone()
    };
    let report = analyse(&pollution, &polygons, &source).unwrap();
    let area = polygons.get("Eastland").unwrap().area_km2();
    assert!((report.values["Eastland"] - 3.0 / area).abs() < 1e-15);
    assert_eq!(report.title, "Ground Pollution");

    let outliers = RunConfig {
        outliers: vec!["East".to_string()],
        ..base
    };
    let report = analyse(&outliers, &polygons, &source).unwrap();
    assert_eq!(report.removed, vec!["Eastland"]);
    assert_eq!(report.values.len(), 1);
    // A single value has no spatial autocorrelation
    assert!(report.spatial.is_none());
}

#[test]
fn test_country_mask_output() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = setup(temp_dir.path());
    let polygons = load_polygons(&config).unwrap();
    let source = NetCdfSource::from_config(&config);

    let (fields, cells) = country_mask(&polygons, &source).unwrap();
    assert_eq!(cells.cell_count(), 8);

    let mask_path = temp_dir.path().join("mask.nc");
    CountryMaskWriter::new(&mask_path)
        .write(&polygons, &cells, &fields.lons, &fields.lats)
        .unwrap();

    let file = open(&mask_path).unwrap();
    let var = file.variable("country_index").unwrap();
    let mask = var.get_values::<i32, _>(..).unwrap();
    // [lat, lon]; Eastland = 0, Tinyland = 1, Westland = 2
    assert_eq!(mask, vec![2, 2, 0, 0, 2, 2, 0, 0]);
    assert!(!mask.contains(&NO_COUNTRY));

    match file.attribute("countries").unwrap().value().unwrap() {
        AttributeValue::Strs(names) => {
            assert_eq!(names, vec!["Eastland", "Tinyland", "Westland"]);
        }
        other => panic!("unexpected countries attribute {other:?}"),
    }
    assert!(file.attribute("history").is_some());
}

#[test]
fn test_list_species() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config = setup(temp_dir.path());

    let file = open(config.emission_path()).unwrap();
    let species = list_species(&file);
    assert_eq!(species.len(), 1);
    assert_eq!(species[0].name, "BC");
    assert_eq!(species[0].units.as_deref(), Some("kg m-2 s-1"));
    assert_eq!(
        species[0].dimensions,
        vec![
            ("time".to_string(), 2),
            ("lev".to_string(), 3),
            ("lat".to_string(), 2),
            ("lon".to_string(), 4),
        ]
    );
}

/// Shapefile ring: shapefile outer rings run clockwise, holes counter-clockwise
fn shp_ring(corners: &[(f64, f64)]) -> Vec<shapefile::Point> {
    corners
        .iter()
        .map(|&(x, y)| shapefile::Point::new(x, y))
        .collect()
}

fn write_shapefile(path: &Path) -> aerocountry::Result<()> {
    let name_field = FieldName::try_from("NAME_ENGL").unwrap();
    let table = TableWriterBuilder::new().add_character_field(name_field, 32);
    let mut writer = shapefile::Writer::from_path(path, table)?;

    let named = |name: Option<&str>| {
        let mut record = Record::default();
        record.insert(
            "NAME_ENGL".to_string(),
            FieldValue::Character(name.map(str::to_string)),
        );
        record
    };

    // Westland with a hole over lon 1..2, lat 41..42
    let outer = shp_ring(&[(0.0, 40.0), (0.0, 44.0), (4.0, 44.0), (4.0, 40.0), (0.0, 40.0)]);
    let hole = shp_ring(&[(1.0, 41.0), (2.0, 41.0), (2.0, 42.0), (1.0, 42.0), (1.0, 41.0)]);
    let westland =
        shapefile::Polygon::with_rings(vec![PolygonRing::Outer(outer), PolygonRing::Inner(hole)]);
    writer.write_shape_and_record(&westland, &named(Some("Westland\0\0\0\0")))?;

    // Eastland in two parts
    let west_part = shp_ring(&[(4.0, 40.0), (4.0, 44.0), (6.0, 44.0), (6.0, 40.0), (4.0, 40.0)]);
    let east_part = shp_ring(&[(6.0, 40.0), (6.0, 44.0), (8.0, 44.0), (8.0, 40.0), (6.0, 40.0)]);
    let eastland = shapefile::Polygon::with_rings(vec![
        PolygonRing::Outer(west_part),
        PolygonRing::Outer(east_part),
    ]);
    writer.write_shape_and_record(&eastland, &named(Some("Eastland")))?;

    let unnamed = shapefile::Polygon::new(PolygonRing::Outer(shp_ring(&[
        (20.0, 40.0),
        (20.0, 41.0),
        (21.0, 41.0),
        (21.0, 40.0),
        (20.0, 40.0),
    ])));
    writer.write_shape_and_record(&unnamed, &named(None))?;

    drop(writer);
    Ok(())
}

#[test]
fn test_shapefile_boundaries() -> aerocountry::Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let shp_path = temp_dir.path().join("countries.shp");
    write_shapefile(&shp_path)?;

    let boundaries = load_boundaries(&shp_path, "NAME_ENGL")?;
    let names: Vec<&str> = boundaries.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Westland", "Eastland"]);
    assert_eq!(boundaries[0].shape.0.len(), 1);
    assert_eq!(boundaries[0].shape.0[0].interiors().len(), 1);
    assert_eq!(boundaries[1].shape.0.len(), 2);

    let country_list = temp_dir.path().join("countries.json");
    fs::write(&country_list, r#"["Eastland", "Westland"]"#)?;
    let config = RunConfig {
        boundaries: shp_path,
        country_list,
        ..RunConfig::default()
    };
    let polygons = load_polygons(&config)?;
    assert_eq!(polygons.len(), 2);
    assert_eq!(find_country(&polygons, 3.0, 43.0), Some("Westland"));
    assert_eq!(find_country(&polygons, 1.5, 41.5), None);
    assert_eq!(find_country(&polygons, 7.0, 41.0), Some("Eastland"));

    // The hole is left out of the area: 15 of 16 square degrees
    let westland = polygons.get("Westland").unwrap().area_km2();
    let eastland = polygons.get("Eastland").unwrap().area_km2();
    assert!(westland < eastland);
    Ok(())
}
