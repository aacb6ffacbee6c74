//! Spatial autocorrelation of per-country values
//!
//! Countries are linked by an inverse-distance weight matrix built from their
//! projected centroids (see [`weights`]). On top of it the global Moran's I,
//! Geary's C and the local Moran's I of every country are computed.

pub mod autocorrelation;
pub mod weights;

pub use autocorrelation::{gearys_c, morans_i_global, morans_i_local};
pub use weights::{spatial_weights, weights_from_points};

use crate::errors::{AeroCountryError, Result};
use crate::geometry::CountryPolygons;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Spatial statistics of one set of country values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialSummary {
    pub morans_i_global: f64,
    pub gearys_c: f64,
    pub morans_i_local: BTreeMap<String, f64>,
}

/// Compute all spatial statistics of `values`
///
/// Every country in `values` must have a region in `polygons`.
///
/// # Errors
///
/// Returns [`AeroCountryError::DegenerateStatistic`] if any statistic is
/// undefined for these values, or [`AeroCountryError::InvalidConfig`] if a
/// country has no region.
pub fn spatial_summary(
    polygons: &CountryPolygons,
    values: &BTreeMap<String, f64>,
) -> Result<SpatialSummary> {
    let regions = values
        .keys()
        .map(|name| {
            polygons.get(name).ok_or_else(|| AeroCountryError::InvalidConfig {
                message: format!("no region for country '{name}'"),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let series: Vec<f64> = values.values().copied().collect();

    let weights = spatial_weights(&regions)?;
    debug!(countries = series.len(), weight_sum = weights.sum(), "Built spatial weights");

    let global = morans_i_global(&series, &weights)?;
    let geary = gearys_c(&series, &weights)?;
    let local = morans_i_local(&series, &weights)?;

    Ok(SpatialSummary {
        morans_i_global: global,
        gearys_c: geary,
        morans_i_local: values.keys().cloned().zip(local).collect(),
    })
}
