//! Gridded emission and pollution fields
//!
//! Analysis code only needs two 2D fields on a common longitude/latitude grid:
//! the emission summed over the selected altitude levels, and the ground-level
//! pollution caused by aircraft. [`CellFields`] holds them; a [`FieldSource`]
//! produces them, either from NetCDF files ([`NetCdfSource`]) or from memory.

pub mod netcdf_source;

pub use netcdf_source::NetCdfSource;

use crate::attribution::GridCell;
use crate::errors::{AeroCountryError, Result};
use ndarray::Array2;

/// Emission and pollution per grid cell, both indexed `[lat, lon]`
#[derive(Debug, Clone, PartialEq)]
pub struct CellFields {
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub emission: Array2<f64>,
    pub pollution: Array2<f64>,
}

impl CellFields {
    /// Bundle coordinate axes and fields, checking that the shapes agree
    ///
    /// # Errors
    ///
    /// Returns [`AeroCountryError::GridMismatch`] if either field is not
    /// `lats.len() x lons.len()`.
    pub fn new(
        lons: Vec<f64>,
        lats: Vec<f64>,
        emission: Array2<f64>,
        pollution: Array2<f64>,
    ) -> Result<Self> {
        let expected = [lats.len(), lons.len()];
        for (name, field) in [("emission", &emission), ("pollution", &pollution)] {
            if field.shape() != expected.as_slice() {
                return Err(AeroCountryError::GridMismatch {
                    message: format!(
                        "{name} field has shape {:?}, expected {:?}",
                        field.shape(),
                        expected
                    ),
                });
            }
        }
        Ok(Self {
            lons,
            lats,
            emission,
            pollution,
        })
    }

    #[must_use]
    pub fn emission_at(&self, cell: GridCell) -> f64 {
        self.emission[[cell.lat_idx, cell.lon_idx]]
    }

    #[must_use]
    pub fn pollution_at(&self, cell: GridCell) -> f64 {
        self.pollution[[cell.lat_idx, cell.lon_idx]]
    }
}

/// Something that can produce the per-cell fields for a run
pub trait FieldSource {
    /// Short human-readable description used in log messages
    fn describe(&self) -> String;

    /// Load (or compute) the fields
    ///
    /// # Errors
    ///
    /// Implementations return an error when the underlying data cannot be read
    /// or does not have the expected layout.
    fn load_fields(&self) -> Result<CellFields>;
}

impl FieldSource for CellFields {
    fn describe(&self) -> String {
        format!("in-memory grid {}x{}", self.lons.len(), self.lats.len())
    }

    fn load_fields(&self) -> Result<CellFields> {
        Ok(self.clone())
    }
}
