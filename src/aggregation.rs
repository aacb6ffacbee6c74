//! Per-country raw samples
//!
//! Every grid cell attributed to a country contributes one emission and one
//! pollution sample. The samples are kept individually so that both the area
//! sum and the median can be derived later.

use crate::attribution::CountryCells;
use crate::dataset::CellFields;
use crate::geometry::CountryPolygons;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Emission and pollution samples of one country, in cell scan order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountrySamples {
    pub emission: Vec<f64>,
    pub pollution: Vec<f64>,
}

/// Raw samples for every country that received at least one cell
pub type RawCountryData = BTreeMap<String, CountrySamples>;

/// Gather the samples of each country's cells from `fields`
#[must_use]
pub fn collect_raw_data(cells: &CountryCells, fields: &CellFields) -> RawCountryData {
    cells
        .iter()
        .map(|(country, country_cells)| {
            let samples = CountrySamples {
                emission: country_cells.iter().map(|&c| fields.emission_at(c)).collect(),
                pollution: country_cells.iter().map(|&c| fields.pollution_at(c)).collect(),
            };
            debug!(country, cells = country_cells.len(), "Collected samples");
            (country.to_string(), samples)
        })
        .collect()
}

/// Countries that have polygons but no data, in alphabetical order
///
/// These are typically countries too small to contain a grid cell centre.
#[must_use]
pub fn unavailable_countries(polygons: &CountryPolygons, raw: &RawCountryData) -> Vec<String> {
    polygons
        .names()
        .filter(|name| !raw.contains_key(*name))
        .map(str::to_string)
        .collect()
}
