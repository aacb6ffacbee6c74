//! Lambert Azimuthal Equal Area projection on an ellipsoid.
//!
//! Used to turn country centroids into planar coordinates in metres before
//! computing distances for the spatial weight matrix. The default parameters
//! are those of ETRS89-LAEA Europe (EPSG:3035):
//! - Ellipsoid: GRS80
//! - Latitude of origin: 52°N
//! - Longitude of origin: 10°E
//! - False easting / northing: 4 321 000 m / 3 210 000 m
//!
//! Formulas follow IOGP Guidance Note 7-2, method 9820.

use std::f64::consts::FRAC_PI_2;

/// Ellipsoidal Lambert Azimuthal Equal Area projection parameters.
#[derive(Debug, Clone)]
pub struct LambertAzimuthalEqualArea {
    /// Longitude of natural origin in radians
    pub lon0: f64,
    /// False easting (metres)
    pub false_easting: f64,
    /// False northing (metres)
    pub false_northing: f64,
    /// First eccentricity
    e: f64,
    /// Authalic radius (metres)
    rq: f64,
    /// Ellipsoid correction factor D
    d: f64,
    /// q at the pole
    qp: f64,
    /// Authalic latitude of origin
    beta0: f64,
}

impl LambertAzimuthalEqualArea {
    /// Create a projection from origin and ellipsoid parameters.
    ///
    /// # Arguments
    /// * `lat0_deg` - Latitude of natural origin (degrees)
    /// * `lon0_deg` - Longitude of natural origin (degrees)
    /// * `false_easting` - Easting of the origin (metres)
    /// * `false_northing` - Northing of the origin (metres)
    /// * `semi_major` - Ellipsoid semi-major axis (metres)
    /// * `inverse_flattening` - Ellipsoid inverse flattening
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        false_easting: f64,
        false_northing: f64,
        semi_major: f64,
        inverse_flattening: f64,
    ) -> Self {
        let f = 1.0 / inverse_flattening;
        let e2 = f * (2.0 - f);
        let e = e2.sqrt();

        let lat0 = lat0_deg.to_radians();
        let qp = q(FRAC_PI_2, e);
        let q0 = q(lat0, e);
        let beta0 = (q0 / qp).asin();
        let rq = semi_major * (qp / 2.0).sqrt();
        let d = semi_major * (lat0.cos() / (1.0 - e2 * lat0.sin().powi(2)).sqrt())
            / (rq * beta0.cos());

        Self {
            lon0: lon0_deg.to_radians(),
            false_easting,
            false_northing,
            e,
            rq,
            d,
            qp,
            beta0,
        }
    }

    /// ETRS89-LAEA Europe (EPSG:3035).
    pub fn etrs89() -> Self {
        Self::new(
            52.0,          // lat0
            10.0,          // lon0
            4_321_000.0,   // false easting
            3_210_000.0,   // false northing
            6_378_137.0,   // GRS80 semi-major axis
            298.257222101, // GRS80 inverse flattening
        )
    }

    /// Project geographic coordinates (degrees) to (easting, northing) in metres.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;

        let beta = (q(lat, self.e) / self.qp).clamp(-1.0, 1.0).asin();
        let (sin_b, cos_b) = beta.sin_cos();
        let (sin_b0, cos_b0) = self.beta0.sin_cos();

        let denom = 1.0 + sin_b0 * sin_b + cos_b0 * cos_b * dlon.cos();
        let b = self.rq * (2.0 / denom).sqrt();

        let easting = self.false_easting + b * self.d * cos_b * dlon.sin();
        let northing =
            self.false_northing + (b / self.d) * (cos_b0 * sin_b - sin_b0 * cos_b * dlon.cos());
        (easting, northing)
    }
}

/// Project to EPSG:3035 (easting, northing) in metres
pub fn etrs89_laea(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    LambertAzimuthalEqualArea::etrs89().project(lon_deg, lat_deg)
}

/// Authalic q function of latitude
fn q(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let e_sin = e * sin_lat;
    (1.0 - e * e)
        * (sin_lat / (1.0 - e_sin * e_sin)
            - (1.0 / (2.0 * e)) * ((1.0 - e_sin) / (1.0 + e_sin)).ln())
}
