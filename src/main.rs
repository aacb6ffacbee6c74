//! Entry point for the aerocountry application.
//! Handles CLI parsing, logging setup, and dispatches to species listing or a full analysis run.

use aerocountry::altitude::AltitudeTable;
use aerocountry::config::RunConfig;
use aerocountry::dataset::NetCdfSource;
use aerocountry::metadata::print_species;
use aerocountry::netcdf_io::CountryMaskWriter;
use aerocountry::parallel::{get_parallel_info, ParallelConfig};
use aerocountry::pipeline::{analyse, country_mask, load_polygons};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "aerocountry=debug" } else { "aerocountry=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    println!(
        r#"
------------------------------------------------------------------
                    aerocountry
     aviation emissions and ground pollution, country by country
------------------------------------------------------------------
"#
    );

    let parallel = match args.threads {
        Some(threads) => ParallelConfig::new(Some(threads)),
        None => ParallelConfig::all_cores(),
    };
    parallel.setup_global_pool()?;
    if args.verbose {
        get_parallel_info().print_info();
    }

    if let Some(path) = &args.list_species {
        print_species(path)?;
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading run configuration");
            RunConfig::from_path(path)?
        }
        None => RunConfig::default(),
    };
    args.apply_to(&mut config);

    if let (Some((low, high)), Some(table)) = (args.altitude_km, &args.altitude_table) {
        let table = AltitudeTable::from_path(table)?;
        config.emission_levels = table.levels_for_altitudes(low, high)?;
        info!(
            low_km = low,
            high_km = high,
            levels = %config.emission_levels,
            bottom_km = table.altitude_for_level(config.emission_levels.start),
            top_km = table.altitude_for_level(config.emission_levels.stop),
            "Resolved altitude band to emission levels"
        );
    }
    config.validate()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let polygons = load_polygons(&config)?;
    let source = NetCdfSource::from_config(&config);

    let report = analyse(&config, &polygons, &source)?;
    report.print();

    if let Some(output_path) = &args.output_json {
        report.write_json(output_path)?;
        println!("✅ Saved report to {}", output_path.display());
    }

    if let Some(output_path) = &args.output_netcdf {
        let (fields, cells) = country_mask(&polygons, &source)?;
        CountryMaskWriter::new(output_path).write(&polygons, &cells, &fields.lons, &fields.lats)?;
        println!("✅ Saved country mask to {}", output_path.display());
    }

    Ok(())
}
