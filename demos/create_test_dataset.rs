//! Creates a small synthetic dataset for trying out aerocountry.
//!
//! Writes, below `demo/`, an emission file, the aircraft ON/OFF pollution pair
//! for July, a GeoJSON file with rectangular stand-in countries, the country
//! list and a run configuration pointing at all of them.

use aerocountry::config::{data_filename, RunConfig, Season};
use ndarray::{Array1, Array4};
use netcdf::create;
use std::fs;
use std::path::Path;

/// (name, min_lon, min_lat, max_lon, max_lat)
const COUNTRIES: [(&str, f64, f64, f64, f64); 5] = [
    ("Iberia", -10.0, 36.0, 3.0, 44.0),
    ("Gallia", -5.0, 44.0, 8.0, 51.0),
    ("Germania", 6.0, 51.0, 15.0, 55.0),
    ("Italia", 8.0, 38.0, 18.0, 46.0),
    ("Polonia", 15.0, 49.0, 24.0, 55.0),
];

fn coordinate_axes() -> (Vec<f64>, Vec<f64>) {
    let lons = (0..20).map(|i| -11.0 + 2.0 * f64::from(i)).collect();
    let lats = (0..12).map(|i| 35.0 + 2.0 * f64::from(i)).collect();
    (lons, lats)
}

fn write_axes(
    file: &mut netcdf::FileMut,
    levels: &[f64],
    lons: &[f64],
    lats: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    file.add_dimension("time", 4)?;
    file.add_dimension("lev", levels.len())?;
    file.add_dimension("lat", lats.len())?;
    file.add_dimension("lon", lons.len())?;

    for (name, values, units) in [
        ("lev", levels, "level"),
        ("lat", lats, "degrees_north"),
        ("lon", lons, "degrees_east"),
    ] {
        let mut var = file.add_variable::<f64>(name, &[name])?;
        var.put_attribute("units", units)?;
        var.put(Array1::from(values.to_vec()).view(), ..)?;
    }
    Ok(())
}

fn write_emission(path: &Path, lons: &[f64], lats: &[f64]) -> Result<(), Box<dyn std::error::Error>> {
    let levels: Vec<f64> = (1..=20).map(f64::from).collect();
    let mut file = create(path)?;
    file.add_attribute("title", "Synthetic aircraft emission fluxes")?;
    write_axes(&mut file, &levels, lons, lats)?;

    // Cruise-altitude maximum around level 10, busier towards the north-east
    let data = Array4::from_shape_fn((4, levels.len(), lats.len(), lons.len()), |(_, l, j, i)| {
        let vertical = (-((l as f64 - 10.0) / 4.0).powi(2)).exp();
        let horizontal = 1.0 + 0.05 * i as f64 + 0.1 * j as f64;
        1e-12 * vertical * horizontal
    });

    let mut var = file.add_variable::<f64>("BC", &["time", "lev", "lat", "lon"])?;
    var.put_attribute("units", "kg m-2 s-1")?;
    var.put_attribute("long_name", "Black carbon emission flux from aircraft")?;
    var.put_attribute("_FillValue", -1e30f64)?;
    var.put(data.view(), ..)?;
    Ok(())
}

fn write_pollution(
    path: &Path,
    lons: &[f64],
    lats: &[f64],
    aircraft_on: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let levels = [1.0, 2.0, 3.0];
    let mut file = create(path)?;
    file.add_attribute(
        "title",
        if aircraft_on {
            "Synthetic simulation with aircraft emissions"
        } else {
            "Synthetic simulation without aircraft emissions"
        },
    )?;
    write_axes(&mut file, &levels, lons, lats)?;

    let data = Array4::from_shape_fn((4, levels.len(), lats.len(), lons.len()), |(t, l, j, i)| {
        let background = 1e-10 * (1.0 + 0.1 * t as f64) / (1.0 + l as f64);
        let aircraft = if aircraft_on {
            2e-12 * (1.0 + (i as f64 * 0.4).sin().abs() + 0.2 * j as f64)
        } else {
            0.0
        };
        background + aircraft
    });

    let mut var = file.add_variable::<f64>("AerMassBC", &["time", "lev", "lat", "lon"])?;
    var.put_attribute("units", "kg m-3")?;
    var.put_attribute("long_name", "Black carbon aerosol mass concentration")?;
    var.put(data.view(), ..)?;
    Ok(())
}

fn boundaries_geojson() -> serde_json::Value {
    let features: Vec<serde_json::Value> = COUNTRIES
        .iter()
        .map(|&(name, x0, y0, x1, y1)| {
            serde_json::json!({
                "type": "Feature",
                "properties": { "NAME_ENGL": name },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
                }
            })
        })
        .collect();
    serde_json::json!({ "type": "FeatureCollection", "features": features })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = Path::new("demo");
    let data_dir = root.join("Data");
    fs::create_dir_all(&data_dir)?;

    println!("🔨 Creating demo dataset in: {}", root.display());

    let (lons, lats) = coordinate_axes();
    let config = RunConfig {
        data_dir: data_dir.clone(),
        season: Season::Summer,
        boundaries: root.join("countries.geojson"),
        country_list: root.join("countries.json"),
        cache_dir: Some(root.join("cache")),
        emission_multiplier: 1e12,
        ..RunConfig::default()
    };

    for path in [
        config.emission_path(),
        config.pollution_path(true),
        config.pollution_path(false),
    ] {
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }

    write_emission(&config.emission_path(), &lons, &lats)?;
    for aircraft_on in [true, false] {
        write_pollution(&config.pollution_path(aircraft_on), &lons, &lats, aircraft_on)?;
    }

    fs::write(
        &config.boundaries,
        serde_json::to_string_pretty(&boundaries_geojson())?,
    )?;
    let names: Vec<&str> = COUNTRIES.iter().map(|c| c.0).collect();
    fs::write(&config.country_list, serde_json::to_string_pretty(&names)?)?;
    fs::write(root.join("run.json"), serde_json::to_string_pretty(&config)?)?;

    println!("✅ Successfully created demo dataset with:");
    println!("   📏 Grid: lon({}), lat({}), 20 emission levels, 3 pollution levels", lons.len(), lats.len());
    println!(
        "   📈 Files: {}, {}, {}",
        config.emission_file,
        data_filename(&config.pollution_collection, config.season, true),
        data_filename(&config.pollution_collection, config.season, false)
    );
    println!("   🗺️  Countries: {}", names.join(", "));
    println!("\n🧪 Run the analysis with:");
    println!("   cargo run -- --config demo/run.json --output-json demo/report.json");

    Ok(())
}
