//! Command-line interface of the aerocountry binary, defined with `clap`.
//!
//! Every analysis option is optional: unset flags keep the value from the
//! `--config` file, or the built-in default when no file is given.

use aerocountry::config::{AggregationMethod, LevelRange, RunConfig, Season, Statistic};
use aerocountry::processing::ColourScale;
use clap::Parser;
use std::path::PathBuf;

/// Country-level analysis of aviation emissions and ground pollution
#[derive(Parser, Debug)]
#[command(
    version,
    name = "aerocountry",
    about = "Attribute gridded emission and pollution data to countries and analyse its spatial pattern"
)]
pub struct Args {
    /// JSON run configuration; command-line flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing the emission and pollution datasets
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Country boundaries (.shp, .geojson or .json)
    #[arg(long)]
    pub boundaries: Option<PathBuf>,

    /// Attribute holding the country name in the boundary file
    #[arg(long)]
    pub name_field: Option<String>,

    /// JSON list of the countries to analyse
    #[arg(long)]
    pub countries: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub season: Option<Season>,

    /// Emission levels to sum over, formatted as <start>:<stop> (inclusive)
    #[arg(long, value_parser = parse_levels_arg)]
    pub levels: Option<LevelRange>,

    /// Emission altitude band in km, formatted as <low>:<high>; needs --altitude-table
    #[arg(long, value_parser = parse_altitude_arg, requires = "altitude_table", conflicts_with = "levels")]
    pub altitude_km: Option<(f64, f64)>,

    /// Table mapping ETA levels to altitudes in km
    #[arg(long)]
    pub altitude_table: Option<PathBuf>,

    /// Pollution dataset collection, e.g. Soot.24h
    #[arg(long)]
    pub pollution_collection: Option<String>,

    #[arg(long)]
    pub pollution_chemical: Option<String>,

    #[arg(long)]
    pub emission_chemical: Option<String>,

    /// Emission dataset file name inside the data directory
    #[arg(long)]
    pub emission_file: Option<String>,

    #[arg(long, value_enum)]
    pub statistic: Option<Statistic>,

    /// How the cells of a country are combined
    #[arg(long, value_enum)]
    pub method: Option<AggregationMethod>,

    #[arg(long, value_enum)]
    pub colour_scale: Option<ColourScale>,

    /// Comma-separated country names (or name fragments) to leave out
    #[arg(long, value_delimiter = ',')]
    pub outliers: Option<Vec<String>>,

    /// Factor applied to the final statistic
    #[arg(long)]
    pub multiplier: Option<f64>,

    /// Factor applied to every emission sample
    #[arg(long)]
    pub emission_multiplier: Option<f64>,

    /// Ignore any cached raw data and recompute it
    #[arg(long, default_value_t = false)]
    pub recalculate: bool,

    /// Directory for raw-data cache files
    #[arg(long, conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Disable the raw-data cache
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Path to save the report as JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Path to save the grid-cell country mask as NetCDF
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// List the chemical species of a NetCDF file and exit
    #[arg(long)]
    pub list_species: Option<PathBuf>,

    /// Print the resolved run configuration as JSON and exit
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Overwrite the values of `config` that were given on the command line
    pub fn apply_to(&self, config: &mut RunConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut config.data_dir, &self.data_dir);
        set(&mut config.boundaries, &self.boundaries);
        set(&mut config.name_field, &self.name_field);
        set(&mut config.country_list, &self.countries);
        set(&mut config.season, &self.season);
        set(&mut config.emission_levels, &self.levels);
        set(&mut config.pollution_collection, &self.pollution_collection);
        set(&mut config.pollution_chemical, &self.pollution_chemical);
        set(&mut config.emission_chemical, &self.emission_chemical);
        set(&mut config.emission_file, &self.emission_file);
        set(&mut config.statistic, &self.statistic);
        set(&mut config.method, &self.method);
        set(&mut config.colour_scale, &self.colour_scale);
        set(&mut config.outliers, &self.outliers);
        set(&mut config.multiplier, &self.multiplier);
        set(&mut config.emission_multiplier, &self.emission_multiplier);

        if self.recalculate {
            config.recalculate = true;
        }
        if self.no_cache {
            config.cache_dir = None;
        } else if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
    }
}

fn parse_levels_arg(s: &str) -> Result<LevelRange, String> {
    s.parse::<LevelRange>().map_err(|e| e.to_string())
}

fn parse_altitude_arg(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [low, high] => {
            let low = low
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid lower altitude '{}'", low))?;
            let high = high
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid upper altitude '{}'", high))?;
            if low > high {
                return Err(format!("Altitude band {}:{} is reversed", low, high));
            }
            Ok((low, high))
        }
        _ => Err("Invalid format: Expected '<low>:<high>' in km.".to_string()),
    }
}
