//! NetCDF-backed field source
//!
//! Reads the aircraft emission dataset and the pair of pollution datasets
//! simulated with aircraft on and off. Variables are expected to carry named
//! `lon` and `lat` dimensions; `lev` and `time` are optional.

use super::{CellFields, FieldSource};
use crate::config::{LevelRange, RunConfig};
use crate::errors::{AeroCountryError, Result};
use ndarray::{Array2, ArrayD};
use netcdf::{AttributeValue, File, Variable};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Level whose pollution counts as "ground level"
const GROUND_LEVEL: f64 = 1.0;

/// Coordinates of two grids are considered equal within this tolerance (degrees)
const COORD_TOLERANCE: f64 = 1e-6;

/// Reads emission and aircraft-attributable pollution from NetCDF files
#[derive(Debug, Clone)]
pub struct NetCdfSource {
    pub emission_path: PathBuf,
    pub pollution_on_path: PathBuf,
    pub pollution_off_path: PathBuf,
    pub emission_chemical: String,
    pub pollution_chemical: String,
    pub emission_levels: LevelRange,
    pub emission_multiplier: f64,
}

impl NetCdfSource {
    /// Dataset locations and variable names as described by `config`
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            emission_path: config.emission_path(),
            pollution_on_path: config.pollution_path(true),
            pollution_off_path: config.pollution_path(false),
            emission_chemical: config.emission_chemical.clone(),
            pollution_chemical: config.pollution_chemical.clone(),
            emission_levels: config.emission_levels,
            emission_multiplier: config.emission_multiplier,
        }
    }

    /// Emission per cell summed over the selected levels and all other dimensions
    fn read_emission(&self, file: &File) -> Result<(Vec<f64>, Vec<f64>, Array2<f64>)> {
        let field = LoadedVariable::read(file, &self.emission_chemical)?;
        let lons = read_coordinate(file, "lon")?;
        let lats = read_coordinate(file, "lat")?;
        let lon_axis = field.axis("lon")?;
        let lat_axis = field.axis("lat")?;
        field.check_len(lon_axis, lons.len(), "lon")?;
        field.check_len(lat_axis, lats.len(), "lat")?;

        let level_filter = match field.optional_axis("lev") {
            Some(lev_axis) => {
                let levs = read_coordinate(file, "lev")?;
                field.check_len(lev_axis, levs.len(), "lev")?;
                let selected: Vec<bool> =
                    levs.iter().map(|&v| self.emission_levels.contains(v)).collect();
                debug!(
                    levels = selected.iter().filter(|&&s| s).count(),
                    range = %self.emission_levels,
                    "Selected emission levels"
                );
                Some((lev_axis, selected))
            }
            None => None,
        };

        let mut emission = Array2::<f64>::zeros((lats.len(), lons.len()));
        for (idx, &value) in field.data.indexed_iter() {
            if !field.is_valid(value) {
                continue;
            }
            if let Some((lev_axis, selected)) = &level_filter {
                if !selected[idx[*lev_axis]] {
                    continue;
                }
            }
            emission[[idx[lat_axis], idx[lon_axis]]] += value;
        }
        emission.mapv_inplace(|v| v * self.emission_multiplier);

        Ok((lons, lats, emission))
    }

    /// Time-averaged ground-level pollution difference between the ON and OFF runs
    fn read_pollution(&self, on: &File, off: &File) -> Result<(Vec<f64>, Vec<f64>, Array2<f64>)> {
        let with_aircraft = LoadedVariable::read(on, &self.pollution_chemical)?;
        let without_aircraft = LoadedVariable::read(off, &self.pollution_chemical)?;
        if with_aircraft.data.shape() != without_aircraft.data.shape() {
            return Err(AeroCountryError::GridMismatch {
                message: format!(
                    "pollution ON shape {:?} differs from OFF shape {:?}",
                    with_aircraft.data.shape(),
                    without_aircraft.data.shape()
                ),
            });
        }

        if with_aircraft.dim_names != without_aircraft.dim_names {
            return Err(AeroCountryError::GridMismatch {
                message: format!(
                    "pollution ON dimensions {:?} differ from OFF dimensions {:?}",
                    with_aircraft.dim_names, without_aircraft.dim_names
                ),
            });
        }

        let lons = read_coordinate(on, "lon")?;
        let lats = read_coordinate(on, "lat")?;
        check_same_coordinate(off, "lon", &lons)?;
        check_same_coordinate(off, "lat", &lats)?;
        let lon_axis = with_aircraft.axis("lon")?;
        let lat_axis = with_aircraft.axis("lat")?;
        with_aircraft.check_len(lon_axis, lons.len(), "lon")?;
        with_aircraft.check_len(lat_axis, lats.len(), "lat")?;

        let ground = match with_aircraft.optional_axis("lev") {
            Some(lev_axis) => {
                let levs = read_coordinate(on, "lev")?;
                check_same_coordinate(off, "lev", &levs)?;
                with_aircraft.check_len(lev_axis, levs.len(), "lev")?;
                Some((lev_axis, nearest_index(&levs, GROUND_LEVEL)))
            }
            None => None,
        };

        let n_timesteps = with_aircraft
            .optional_axis("time")
            .map_or(1, |axis| with_aircraft.data.shape()[axis].max(1));

        let mut pollution = Array2::<f64>::zeros((lats.len(), lons.len()));
        for ((idx, &value_on), &value_off) in with_aircraft
            .data
            .indexed_iter()
            .zip(without_aircraft.data.iter())
        {
            if let Some((lev_axis, ground_idx)) = ground {
                if idx[lev_axis] != ground_idx {
                    continue;
                }
            }
            if !with_aircraft.is_valid(value_on) || !without_aircraft.is_valid(value_off) {
                continue;
            }
            pollution[[idx[lat_axis], idx[lon_axis]]] += value_on - value_off;
        }
        #[allow(clippy::cast_precision_loss)]
        let n_timesteps = n_timesteps as f64;
        pollution.mapv_inplace(|v| v / n_timesteps);

        Ok((lons, lats, pollution))
    }
}

impl FieldSource for NetCdfSource {
    fn describe(&self) -> String {
        format!(
            "{} ({}) vs {} / {} ({})",
            self.emission_path.display(),
            self.emission_chemical,
            self.pollution_on_path.display(),
            self.pollution_off_path.display(),
            self.pollution_chemical
        )
    }

    fn load_fields(&self) -> Result<CellFields> {
        info!(source = %self.describe(), "Reading NetCDF datasets");

        let emission_file = open(&self.emission_path)?;
        let (lons, lats, emission) = self.read_emission(&emission_file)?;

        let on = open(&self.pollution_on_path)?;
        let off = open(&self.pollution_off_path)?;
        let (poll_lons, poll_lats, pollution) = self.read_pollution(&on, &off)?;

        let pollution = align_to_grid(&pollution, &poll_lons, &poll_lats, &lons, &lats)?;
        CellFields::new(lons, lats, emission, pollution)
    }
}

fn open(path: &Path) -> Result<File> {
    let file = netcdf::open(path)?;
    debug!(path = %path.display(), "Opened NetCDF file");
    Ok(file)
}

/// A variable read fully into memory together with its layout
struct LoadedVariable {
    name: String,
    dim_names: Vec<String>,
    data: ArrayD<f64>,
    fill_value: Option<f64>,
}

impl LoadedVariable {
    fn read(file: &File, name: &str) -> Result<Self> {
        let var = file
            .variable(name)
            .ok_or_else(|| AeroCountryError::VariableNotFound {
                var: name.to_string(),
            })?;

        let dim_names: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let shape: Vec<usize> = var
            .dimensions()
            .iter()
            .map(netcdf::Dimension::len)
            .collect();

        let values = var.get_values::<f64, _>(..)?;
        debug!(variable = name, shape = ?shape, "Loaded variable");

        Ok(Self {
            name: name.to_string(),
            dim_names,
            data: ArrayD::from_shape_vec(shape, values)?,
            fill_value: fill_value(&var),
        })
    }

    fn optional_axis(&self, dim: &str) -> Option<usize> {
        self.dim_names.iter().position(|d| d == dim)
    }

    fn axis(&self, dim: &str) -> Result<usize> {
        self.optional_axis(dim)
            .ok_or_else(|| AeroCountryError::DimensionNotFound {
                var: self.name.clone(),
                dim: dim.to_string(),
            })
    }

    fn check_len(&self, axis: usize, expected: usize, dim: &str) -> Result<()> {
        let actual = self.data.shape()[axis];
        if actual == expected {
            Ok(())
        } else {
            Err(AeroCountryError::GridMismatch {
                message: format!(
                    "variable '{}' has {} entries along '{}' but the coordinate has {}",
                    self.name, actual, dim, expected
                ),
            })
        }
    }

    fn is_valid(&self, value: f64) -> bool {
        value.is_finite() && self.fill_value.map_or(true, |fill| value != fill)
    }
}

fn fill_value(var: &Variable) -> Option<f64> {
    var.attribute("_FillValue")
        .and_then(|attr| match attr.value().ok()? {
            AttributeValue::Float(v) => Some(f64::from(v)),
            AttributeValue::Double(v) => Some(v),
            AttributeValue::Short(v) => Some(f64::from(v)),
            AttributeValue::Int(v) => Some(f64::from(v)),
            _ => None,
        })
}

fn read_coordinate(file: &File, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| AeroCountryError::VariableNotFound {
            var: name.to_string(),
        })?;
    Ok(var.get_values::<f64, _>(..)?)
}

/// The OFF run must share the ON run's grid, value by value
fn check_same_coordinate(off: &File, name: &str, expected: &[f64]) -> Result<()> {
    let actual = read_coordinate(off, name)?;
    let matches = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, b)| (a - b).abs() < COORD_TOLERANCE);
    if matches {
        Ok(())
    } else {
        Err(AeroCountryError::GridMismatch {
            message: format!("pollution OFF '{name}' coordinate differs from the ON file"),
        })
    }
}

/// Index of the coordinate value closest to `target`
fn nearest_index(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map_or(0, |(i, _)| i)
}

/// Re-index a `[lat, lon]` field from its own grid onto the target grid by coordinate value
fn align_to_grid(
    field: &Array2<f64>,
    lons: &[f64],
    lats: &[f64],
    target_lons: &[f64],
    target_lats: &[f64],
) -> Result<Array2<f64>> {
    if lons == target_lons && lats == target_lats {
        return Ok(field.clone());
    }

    let lookup = |axis: &[f64], value: f64, dim: &str| {
        axis.iter()
            .position(|&v| (v - value).abs() < COORD_TOLERANCE)
            .ok_or_else(|| AeroCountryError::GridMismatch {
                message: format!("pollution grid has no {dim} = {value}"),
            })
    };
    let lon_map = target_lons
        .iter()
        .map(|&lon| lookup(lons, lon, "lon"))
        .collect::<Result<Vec<_>>>()?;
    let lat_map = target_lats
        .iter()
        .map(|&lat| lookup(lats, lat, "lat"))
        .collect::<Result<Vec<_>>>()?;

    debug!("Re-indexed pollution field onto the emission grid");
    Ok(Array2::from_shape_fn(
        (target_lats.len(), target_lons.len()),
        |(i, j)| field[[lat_map[i], lon_map[j]]],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_level_to_ground() {
        assert_eq!(nearest_index(&[0.0, 0.98, 2.0], 1.0), 1);
        assert_eq!(nearest_index(&[1.0, 2.0, 3.0], 1.0), 0);
    }

    #[test]
    fn aligns_subset_grid() {
        let field = Array2::from_shape_fn((2, 3), |(i, j)| (i * 10 + j) as f64);
        let aligned =
            align_to_grid(&field, &[0.0, 1.0, 2.0], &[10.0, 11.0], &[2.0, 0.0], &[11.0]).unwrap();
        assert_eq!(aligned.shape(), &[1, 2]);
        assert_eq!(aligned[[0, 0]], 12.0);
        assert_eq!(aligned[[0, 1]], 10.0);
        assert!(align_to_grid(&field, &[0.0, 1.0, 2.0], &[10.0, 11.0], &[5.0], &[10.0]).is_err());
    }
}
