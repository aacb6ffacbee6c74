//! End-to-end analysis run
//!
//! polygons -> raw per-country samples (cached) -> statistic per country ->
//! normalisation and spatial autocorrelation -> [`AnalysisReport`]

use crate::aggregation::{collect_raw_data, unavailable_countries, RawCountryData};
use crate::attribution::{attribute_grid, CountryCells};
use crate::cache;
use crate::config::RunConfig;
use crate::dataset::{CellFields, FieldSource, NetCdfSource};
use crate::errors::{AeroCountryError, Result};
use crate::geometry::{load_boundaries, load_country_list, CountryPolygons};
use crate::processing::{normalise, process_data, ProcessingOptions};
use crate::report::AnalysisReport;
use crate::spatial::spatial_summary;
use chrono::Utc;
use tracing::{info, warn};

/// Load the configured boundaries and clip the listed countries to the frame
///
/// # Errors
///
/// Returns an error if either file cannot be read, or if none of the listed
/// countries lies inside the study frame.
pub fn load_polygons(config: &RunConfig) -> Result<CountryPolygons> {
    let boundaries = load_boundaries(&config.boundaries, &config.name_field)?;
    let wanted = load_country_list(&config.country_list)?;
    let polygons = CountryPolygons::build(&boundaries, &wanted, &config.frame);

    if polygons.is_empty() {
        return Err(AeroCountryError::InvalidBoundaries {
            path: config.boundaries.clone(),
            message: format!(
                "none of the {} listed countries lies inside the study frame",
                wanted.len()
            ),
        });
    }
    Ok(polygons)
}

/// Load the fields of `source` and attribute its grid to countries
///
/// # Errors
///
/// Propagates errors from [`FieldSource::load_fields`].
pub fn country_mask(
    polygons: &CountryPolygons,
    source: &dyn FieldSource,
) -> Result<(CellFields, CountryCells)> {
    info!(source = %source.describe(), "Loading fields");
    let fields = source.load_fields()?;
    let cells = attribute_grid(polygons, &fields.lons, &fields.lats);
    Ok((fields, cells))
}

/// Compute raw per-country samples from `source` without touching the cache
///
/// # Errors
///
/// Propagates errors from [`FieldSource::load_fields`].
pub fn compute_raw_data(
    polygons: &CountryPolygons,
    source: &dyn FieldSource,
) -> Result<RawCountryData> {
    let (fields, cells) = country_mask(polygons, source)?;
    Ok(collect_raw_data(&cells, &fields))
}

/// Run the analysis described by `config` on `polygons` and `source`
///
/// Spatial statistics that are undefined for the resulting values are
/// reported as `None` with a warning rather than failing the run.
///
/// # Errors
///
/// Returns an error if `config` is invalid or the fields cannot be loaded.
pub fn analyse(
    config: &RunConfig,
    polygons: &CountryPolygons,
    source: &dyn FieldSource,
) -> Result<AnalysisReport> {
    config.validate()?;

    let cache_path = config.cache_path();
    let key = config.cache_key().with_countries(polygons.names());
    let (raw, provenance) = cache::load_or_compute(
        cache_path.as_deref(),
        &key,
        config.recalculate,
        || compute_raw_data(polygons, source),
    )?;

    // A cache may name countries that are no longer in the polygon set
    let raw: RawCountryData = raw
        .into_iter()
        .filter(|(country, _)| polygons.get(country).is_some())
        .collect();

    let unavailable = unavailable_countries(polygons, &raw);
    if !unavailable.is_empty() {
        info!(countries = %unavailable.join(", "), "Countries with unavailable data");
    }

    let processed = process_data(
        polygons,
        &raw,
        &ProcessingOptions {
            method: config.method,
            statistic: config.statistic,
            outliers: &config.outliers,
            multiplier: config.multiplier,
        },
    );

    let spatial = match spatial_summary(polygons, &processed.values) {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, "Skipping spatial autocorrelation");
            None
        }
    };

    Ok(AnalysisReport {
        generated_at: Utc::now().to_rfc3339(),
        title: config.statistic.title().to_string(),
        subtitle: config.sub_title(),
        provenance,
        countries_total: polygons.len(),
        unavailable,
        removed: processed.removed,
        normalised: normalise(&processed.values, config.colour_scale),
        values: processed.values,
        spatial,
    })
}

/// Run the full analysis on the NetCDF datasets named by `config`
///
/// # Errors
///
/// See [`load_polygons`] and [`analyse`].
pub fn run_analysis(config: &RunConfig) -> Result<AnalysisReport> {
    let polygons = load_polygons(config)?;
    let source = NetCdfSource::from_config(config);
    analyse(config, &polygons, &source)
}
