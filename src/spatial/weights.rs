//! Inverse-distance weight matrix between country centroids

use crate::errors::{AeroCountryError, Result};
use crate::geometry::{CountryRegion, LambertAzimuthalEqualArea};
use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Weights `w[i][j] = r_i / d_ij` for points in km
///
/// `r_i` is the characteristic radius of country `i`, so the weight expresses
/// how many of its own radii away the neighbour lies. The diagonal is zero.
///
/// # Errors
///
/// Returns [`AeroCountryError::DegenerateStatistic`] when two distinct points
/// coincide or the input lengths differ.
pub fn weights_from_points(centres_km: &[(f64, f64)], radii_km: &[f64]) -> Result<Array2<f64>> {
    let n = centres_km.len();
    if radii_km.len() != n {
        return Err(AeroCountryError::DegenerateStatistic {
            statistic: "Spatial weights",
            reason: format!("{} centroids but {} radii", n, radii_km.len()),
        });
    }

    let mut weights = Array2::<f64>::zeros((n, n));
    weights
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .try_for_each(|(i, mut row)| {
            let (xi, yi) = centres_km[i];
            for (j, (xj, yj)) in centres_km.iter().enumerate() {
                if i == j {
                    continue;
                }
                let distance = (xi - xj).hypot(yi - yj);
                if distance <= 0.0 {
                    return Err((i, j));
                }
                row[j] = radii_km[i] / distance;
            }
            Ok(())
        })
        .map_err(|(i, j)| AeroCountryError::DegenerateStatistic {
            statistic: "Spatial weights",
            reason: format!("centroids {i} and {j} coincide"),
        })?;

    Ok(weights)
}

/// Weight matrix for `regions`, with centroids projected to EPSG:3035
///
/// # Errors
///
/// Returns [`AeroCountryError::DegenerateStatistic`] when a region has no
/// centroid or two centroids coincide.
pub fn spatial_weights(regions: &[&CountryRegion]) -> Result<Array2<f64>> {
    let projection = LambertAzimuthalEqualArea::etrs89();

    let centres_km = regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let centroid = region
                .centroid()
                .ok_or_else(|| AeroCountryError::DegenerateStatistic {
                    statistic: "Spatial weights",
                    reason: format!("region {i} has no centroid"),
                })?;
            let (easting, northing) = projection.project(centroid.x(), centroid.y());
            Ok((easting / 1000.0, northing / 1000.0))
        })
        .collect::<Result<Vec<_>>>()?;
    let radii_km: Vec<f64> = regions
        .iter()
        .map(|region| region.characteristic_radius_km())
        .collect();

    weights_from_points(&centres_km, &radii_km)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_scale_with_own_radius() {
        let centres = [(0.0, 0.0), (3.0, 4.0)];
        let weights = weights_from_points(&centres, &[10.0, 5.0]).unwrap();
        assert_eq!(weights[[0, 0]], 0.0);
        assert_eq!(weights[[1, 1]], 0.0);
        assert!((weights[[0, 1]] - 2.0).abs() < 1e-12);
        assert!((weights[[1, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_centroids_are_rejected() {
        let centres = [(1.0, 1.0), (1.0, 1.0)];
        assert!(matches!(
            weights_from_points(&centres, &[1.0, 1.0]),
            Err(AeroCountryError::DegenerateStatistic { .. })
        ));
    }
}
