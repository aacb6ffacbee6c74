//! NetCDF output of the grid-cell attribution
//!
//! The mask file holds one `country_index(lat, lon)` variable on the data grid.
//! Index `k` refers to the `k`-th name of the global `countries` attribute and
//! `-1` marks cells outside every country.

use crate::attribution::CountryCells;
use crate::errors::{AeroCountryError, Result};
use crate::geometry::CountryPolygons;
use chrono::Utc;
use ndarray::Array2;
use netcdf::create;
use std::{fs, path::Path};
use tracing::info;

/// Value of `country_index` for unattributed cells
pub const NO_COUNTRY: i32 = -1;

/// Writer for country attribution masks
pub struct CountryMaskWriter<'a> {
    output_path: &'a Path,
}

impl<'a> CountryMaskWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write the mask of `cells` on the `lons` x `lats` grid
    ///
    /// Countries are numbered in the alphabetical order of `polygons`, so
    /// countries without any cell still keep a stable index.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or a cell lies outside
    /// the grid.
    pub fn write(
        &self,
        polygons: &CountryPolygons,
        cells: &CountryCells,
        lons: &[f64],
        lats: &[f64],
    ) -> Result<()> {
        let names: Vec<String> = polygons.names().map(str::to_string).collect();
        let mask = country_index(&names, cells, lons.len(), lats.len())?;

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let mut file = create(self.output_path)?;

        file.add_dimension("lat", lats.len())?;
        file.add_dimension("lon", lons.len())?;

        let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(lats, ..)?;

        let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(lons, ..)?;

        let mut index_var = file.add_variable::<i32>("country_index", &["lat", "lon"])?;
        index_var.put_attribute("_FillValue", NO_COUNTRY)?;
        index_var.put_attribute(
            "long_name",
            "index into the countries attribute of the country containing the cell centre",
        )?;
        index_var.put(mask.view(), ..)?;

        file.add_attribute("countries", names)?;
        file.add_attribute(
            "history",
            format!("Created by aerocountry on {}", Utc::now().to_rfc3339()),
        )?;

        info!(
            path = %self.output_path.display(),
            cells = cells.cell_count(),
            "Wrote country mask"
        );
        Ok(())
    }
}

/// Build the `[lat, lon]` index grid for `cells`
///
/// # Errors
///
/// Returns [`AeroCountryError::GridMismatch`] if a cell is outside the grid or
/// its country is not in `names`.
pub fn country_index(
    names: &[String],
    cells: &CountryCells,
    n_lon: usize,
    n_lat: usize,
) -> Result<Array2<i32>> {
    let mut mask = Array2::from_elem((n_lat, n_lon), NO_COUNTRY);

    for (country, country_cells) in cells.iter() {
        let index = names
            .iter()
            .position(|name| name == country)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| AeroCountryError::GridMismatch {
                message: format!("country '{country}' has cells but no index"),
            })?;
        for cell in country_cells {
            let slot = mask.get_mut([cell.lat_idx, cell.lon_idx]).ok_or_else(|| {
                AeroCountryError::GridMismatch {
                    message: format!(
                        "cell ({}, {}) outside a {n_lon}x{n_lat} grid",
                        cell.lon_idx, cell.lat_idx
                    ),
                }
            })?;
            *slot = index;
        }
    }

    Ok(mask)
}
