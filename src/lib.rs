//! aerocountry: country-level analysis of aviation emissions and ground pollution
//!
//! Gridded NetCDF output of an atmospheric chemistry model is attributed to
//! countries, reduced to one value per country and examined for spatial
//! autocorrelation.
//!
//! ## Key Features
//!
//! - **Country attribution**: every grid cell centre is assigned to the country
//!   polygon (ESRI shapefile or GeoJSON) containing it, in parallel with Rayon
//! - **Emission and pollution fields**: emission summed over a band of altitude
//!   levels, ground pollution as the aircraft-on minus aircraft-off difference
//! - **Statistics**: pollution/emission ratio or per-area emissions and pollution,
//!   by area sum or median
//! - **Spatial autocorrelation**: global Moran's I, Geary's C and local Moran's I
//!   on inverse-distance weights between projected country centroids
//! - **Caching**: the expensive raw per-country data is cached as JSON
//!
//! ## Module Organization
//!
//! - [`config`]: run configuration and file naming conventions
//! - [`geometry`]: boundary loading, clipping, areas and projection
//! - [`attribution`]: grid cell to country assignment
//! - [`altitude`]: ETA level / altitude lookup
//! - [`dataset`]: emission and pollution field sources
//! - [`aggregation`] and [`cache`]: raw per-country samples
//! - [`processing`]: per-country statistic and colour scales
//! - [`spatial`]: spatial weights and autocorrelation
//! - [`pipeline`] and [`report`]: complete runs and their results
//! - [`metadata`], [`netcdf_io`]: NetCDF inspection and mask output
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aerocountry::prelude::*;
//!
//! let config = RunConfig::from_path("run.json".as_ref())?;
//! let report = run_analysis(&config)?;
//! report.print();
//! # Ok::<(), AeroCountryError>(())
//! ```

pub mod aggregation;
pub mod altitude;
pub mod attribution;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod geometry;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod pipeline;
pub mod processing;
pub mod report;
pub mod spatial;

pub use errors::{AeroCountryError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::{AggregationMethod, LevelRange, RunConfig, Season, Statistic};
    pub use crate::dataset::{CellFields, FieldSource, NetCdfSource};
    pub use crate::errors::{AeroCountryError, Result};
    pub use crate::geometry::{CountryPolygons, CountryRegion};
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{analyse, run_analysis};
    pub use crate::processing::ColourScale;
    pub use crate::report::AnalysisReport;
}
