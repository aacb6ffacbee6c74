//! Global and local spatial autocorrelation indices
//!
//! All functions take the values in the same order as the rows of the weight
//! matrix. Input on which an index is undefined yields
//! [`AeroCountryError::DegenerateStatistic`] instead of a NaN.

use crate::errors::{AeroCountryError, Result};
use ndarray::Array2;

/// Deviations from the mean together with their sum of squares
struct Deviations {
    z: Vec<f64>,
    sum_sq: f64,
}

fn deviations(statistic: &'static str, values: &[f64], weights: &Array2<f64>) -> Result<Deviations> {
    let n = values.len();
    if n < 2 {
        return Err(AeroCountryError::DegenerateStatistic {
            statistic,
            reason: format!("needs at least 2 values, got {n}"),
        });
    }
    if weights.dim() != (n, n) {
        return Err(AeroCountryError::DegenerateStatistic {
            statistic,
            reason: format!("{n} values but a {:?} weight matrix", weights.dim()),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AeroCountryError::DegenerateStatistic {
            statistic,
            reason: "values must be finite".to_string(),
        });
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let z: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let sum_sq: f64 = z.iter().map(|d| d * d).sum();

    // Equal values can still leave rounding residue in `z`
    if values.iter().all(|&v| v == values[0]) || sum_sq == 0.0 {
        return Err(AeroCountryError::DegenerateStatistic {
            statistic,
            reason: "values have zero variance".to_string(),
        });
    }

    Ok(Deviations { z, sum_sq })
}

fn weight_sum(statistic: &'static str, weights: &Array2<f64>) -> Result<f64> {
    let total = weights.sum();
    if total > 0.0 && total.is_finite() {
        Ok(total)
    } else {
        Err(AeroCountryError::DegenerateStatistic {
            statistic,
            reason: format!("weights sum to {total}"),
        })
    }
}

/// Global Moran's I: `(n / W) · Σ w_ij z_i z_j / Σ z_i²`
///
/// # Errors
///
/// See the module documentation.
pub fn morans_i_global(values: &[f64], weights: &Array2<f64>) -> Result<f64> {
    const NAME: &str = "Global Moran's I";
    let Deviations { z, sum_sq } = deviations(NAME, values, weights)?;
    let total = weight_sum(NAME, weights)?;

    let cross: f64 = weights
        .indexed_iter()
        .map(|((i, j), w)| w * z[i] * z[j])
        .sum();

    Ok(values.len() as f64 / total * cross / sum_sq)
}

/// Geary's C: `(n - 1) Σ w_ij (x_i - x_j)² / (2 W Σ z_i²)`
///
/// # Errors
///
/// See the module documentation.
pub fn gearys_c(values: &[f64], weights: &Array2<f64>) -> Result<f64> {
    const NAME: &str = "Geary's C";
    let Deviations { sum_sq, .. } = deviations(NAME, values, weights)?;
    let total = weight_sum(NAME, weights)?;

    let squared_differences: f64 = weights
        .indexed_iter()
        .map(|((i, j), w)| {
            let d = values[i] - values[j];
            w * d * d
        })
        .sum();

    Ok((values.len() - 1) as f64 * squared_differences / (2.0 * total * sum_sq))
}

/// Local Moran's I of every value with row-standardised weights
///
/// `I_i = z_i / S_i² · Σ_j (w_ij / Σ_k w_ik) z_j` where
/// `S_i² = Σ_{j≠i} z_j² / (n - 1)`.
///
/// # Errors
///
/// Also fails when a row has no positive weight or when all other values
/// equal the mean.
pub fn morans_i_local(values: &[f64], weights: &Array2<f64>) -> Result<Vec<f64>> {
    const NAME: &str = "Local Moran's I";
    let Deviations { z, sum_sq } = deviations(NAME, values, weights)?;
    let n = values.len();

    weights
        .outer_iter()
        .enumerate()
        .map(|(i, row)| {
            let row_sum = row.sum();
            if row_sum <= 0.0 {
                return Err(AeroCountryError::DegenerateStatistic {
                    statistic: NAME,
                    reason: format!("row {i} has no neighbours"),
                });
            }
            let s2 = (sum_sq - z[i] * z[i]) / (n - 1) as f64;
            if s2 <= 0.0 {
                return Err(AeroCountryError::DegenerateStatistic {
                    statistic: NAME,
                    reason: format!("all values except {i} equal the mean"),
                });
            }
            let lag: f64 = row.iter().zip(&z).map(|(w, zj)| w / row_sum * zj).sum();
            Ok(z[i] / s2 * lag)
        })
        .collect()
}
