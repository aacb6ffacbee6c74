//! Conversion between altitude and model (ETA) levels
//!
//! The lookup table is a whitespace separated text file with three header
//! lines followed by rows of `index level altitude_km ...`, ordered from the
//! top of the model atmosphere down to the ground.

use crate::config::LevelRange;
use crate::errors::{AeroCountryError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const HEADER_LINES: usize = 3;

/// One row of the altitude table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeLevel {
    pub level: u32,
    pub altitude_km: f64,
}

/// ETA level / altitude lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct AltitudeTable {
    rows: Vec<AltitudeLevel>,
}

impl AltitudeTable {
    /// Read a table from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a row is malformed.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Parse a table from any buffered reader
    ///
    /// # Errors
    ///
    /// Returns [`AeroCountryError::InvalidConfig`] naming the offending line if a
    /// row has fewer than three columns or non-numeric values.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut rows = Vec::new();
        for (number, line) in reader.lines().enumerate().skip(HEADER_LINES) {
            let line = line?;
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.is_empty() {
                continue;
            }
            let malformed = || AeroCountryError::InvalidConfig {
                message: format!("malformed altitude table row {}: '{}'", number + 1, line),
            };
            if columns.len() < 3 {
                return Err(malformed());
            }
            // Levels are sometimes written as floats ("72.0")
            let level = columns[1].parse::<f64>().map_err(|_| malformed())?;
            let altitude_km = columns[2].parse::<f64>().map_err(|_| malformed())?;
            if level < 0.0 || level.fract() != 0.0 {
                return Err(malformed());
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let level = level as u32;
            rows.push(AltitudeLevel { level, altitude_km });
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[AltitudeLevel] {
        &self.rows
    }

    /// Find the table row bracketing altitude `h` (km)
    ///
    /// Returns the tabulated altitude and level of the row `i` with
    /// `alt[i] >= h > alt[i + 1]`. Altitudes below 1 km map to `(0.0, 1)`.
    /// `None` if `h` lies above the table.
    #[must_use]
    pub fn level_for_altitude(&self, h: f64) -> Option<(f64, u32)> {
        if h < 1.0 {
            return Some((0.0, 1));
        }
        self.rows
            .windows(2)
            .find(|pair| pair[0].altitude_km >= h && pair[1].altitude_km < h)
            .map(|pair| (pair[0].altitude_km, pair[0].level))
    }

    /// Tabulated altitude (km) of `level`
    ///
    /// Uses the row with the largest tabulated level not above `level`, so a
    /// level between two rows takes the altitude of the lower one. Levels
    /// outside the tabulated range fall back to sea level, the lowest altitude
    /// in the table.
    #[must_use]
    pub fn altitude_for_level(&self, level: u32) -> f64 {
        let sea_level = self
            .rows
            .iter()
            .map(|row| row.altitude_km)
            .reduce(f64::min)
            .unwrap_or(0.0);
        let top = self.rows.iter().map(|row| row.level).max();
        if top.map_or(true, |top| level > top) {
            return sea_level;
        }
        self.rows
            .iter()
            .filter(|row| row.level <= level)
            .max_by_key(|row| row.level)
            .map_or(sea_level, |row| row.altitude_km)
    }

    /// Level range covering the altitude band `low_km..=high_km`
    ///
    /// # Errors
    ///
    /// Returns [`AeroCountryError::InvalidConfig`] if either bound is outside the table.
    pub fn levels_for_altitudes(&self, low_km: f64, high_km: f64) -> Result<LevelRange> {
        let lookup = |h: f64| {
            self.level_for_altitude(h)
                .map(|(_, level)| level)
                .ok_or_else(|| AeroCountryError::InvalidConfig {
                    message: format!("altitude {h} km is outside the altitude table"),
                })
        };
        let (a, b) = (lookup(low_km)?, lookup(high_km)?);
        LevelRange::new(a.min(b), a.max(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
GEOS-Chem vertical levels
 L  ETA  altitude(km)  pressure(hPa)
--------------------------------------
 0  14   2.0   790.0
 1  11   1.5   840.0
 2   8   1.0   900.0
 3   5   0.5   950.0
 4   1   0.06  1005.0
";

    #[test]
    fn parses_rows_after_header() {
        let table = AltitudeTable::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.rows().len(), 5);
        assert_eq!(
            table.rows()[0],
            AltitudeLevel {
                level: 14,
                altitude_km: 2.0
            }
        );
    }

    #[test]
    fn finds_bracketing_row() {
        let table = AltitudeTable::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.level_for_altitude(1.2), Some((1.5, 11)));
        assert_eq!(table.level_for_altitude(2.0), Some((2.0, 14)));
        assert_eq!(table.level_for_altitude(0.3), Some((0.0, 1)));
        assert_eq!(table.level_for_altitude(5.0), None);
    }

    #[test]
    fn altitude_of_level() {
        let table = AltitudeTable::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.altitude_for_level(11), 1.5);
        assert_eq!(table.altitude_for_level(12), 1.5);
        assert_eq!(table.altitude_for_level(14), 2.0);
        assert_eq!(table.altitude_for_level(3), 0.06);
        // Outside the table: sea level
        assert_eq!(table.altitude_for_level(0), 0.06);
        assert_eq!(table.altitude_for_level(40), 0.06);

        let empty = AltitudeTable::from_reader("a\nb\nc\n".as_bytes()).unwrap();
        assert_eq!(empty.altitude_for_level(5), 0.0);
    }

    #[test]
    fn level_range_from_altitude_band() {
        let table = AltitudeTable::from_reader(TABLE.as_bytes()).unwrap();
        let range = table.levels_for_altitudes(0.0, 1.8).unwrap();
        assert_eq!(range, LevelRange { start: 1, stop: 14 });
        assert!(table.levels_for_altitudes(0.0, 9.0).is_err());
    }

    #[test]
    fn rejects_short_rows() {
        let broken = format!("{TABLE} 5 3\n");
        assert!(AltitudeTable::from_reader(broken.as_bytes()).is_err());
    }
}
