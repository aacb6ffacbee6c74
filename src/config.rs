//! Run configuration
//!
//! A run is fully described by a [`RunConfig`]: which datasets to read, which
//! chemical species and altitude levels to consider, how to summarise each
//! country and which statistic to derive. Configurations can be read from a
//! JSON file and then overridden from the command line.

use crate::errors::{AeroCountryError, Result};
use crate::processing::ColourScale;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Time of year the pollution simulation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// January run
    Winter,
    /// July run
    Summer,
}

impl Season {
    /// Month tag used in dataset and cache file names
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Winter => "JAN",
            Self::Summer => "JUL",
        }
    }

    #[must_use]
    pub const fn month_name(self) -> &'static str {
        match self {
            Self::Winter => "January",
            Self::Summer => "July",
        }
    }
}

/// Inclusive range of `lev` coordinate labels
///
/// Selection is label based: every level whose coordinate value `v` satisfies
/// `start <= v <= stop` is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelRange {
    pub start: u32,
    pub stop: u32,
}

impl LevelRange {
    /// Create a level range, rejecting reversed bounds
    ///
    /// # Errors
    ///
    /// Returns [`AeroCountryError::InvalidConfig`] if `start > stop`.
    pub fn new(start: u32, stop: u32) -> Result<Self> {
        if start > stop {
            return Err(AeroCountryError::InvalidConfig {
                message: format!("level range start {start} is above stop {stop}"),
            });
        }
        Ok(Self { start, stop })
    }

    #[must_use]
    pub fn contains(&self, level: f64) -> bool {
        f64::from(self.start) <= level && level <= f64::from(self.stop)
    }
}

impl Default for LevelRange {
    fn default() -> Self {
        Self { start: 0, stop: 8 }
    }
}

impl fmt::Display for LevelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.stop)
    }
}

impl FromStr for LevelRange {
    type Err = AeroCountryError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AeroCountryError::InvalidConfig {
            message: format!("invalid level range '{s}': expected '<start>:<stop>'"),
        };
        let (start, stop) = s.split_once(':').ok_or_else(invalid)?;
        let start = start.trim().parse::<u32>().map_err(|_| invalid())?;
        let stop = stop.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(start, stop)
    }
}

/// How the per-cell samples of one country are combined into one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Sum over all cells; the area normalisation happens in the statistic
    #[value(name = "average")]
    AreaAverage,
    /// Median of the cell values
    Median,
}

impl AggregationMethod {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AreaAverage => "Area average",
            Self::Median => "Median",
        }
    }
}

/// Derived per-country statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Ground pollution divided by emissions
    Ratio,
    /// Emissions per km² of country area
    Emissions,
    /// Ground pollution per km² of country area
    Pollution,
}

impl Statistic {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Ratio => "Ground Pollution/Emission Ratio",
            Self::Emissions => "Emissions",
            Self::Pollution => "Ground Pollution",
        }
    }

    const fn uses_pollution(self) -> bool {
        matches!(self, Self::Ratio | Self::Pollution)
    }

    const fn uses_emissions(self) -> bool {
        matches!(self, Self::Ratio | Self::Emissions)
    }
}

/// Geographic window covered by the simulation data, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudyFrame {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Default for StudyFrame {
    fn default() -> Self {
        Self {
            min_lon: -30.0,
            min_lat: 30.0,
            max_lon: 50.0,
            max_lat: 70.0,
        }
    }
}

/// Parameters that determine the raw per-country data
///
/// Two runs with equal keys produce identical raw data, so the key is stored in
/// the cache file and compared on load. Besides the dataset selection this
/// covers the inputs of the cell attribution: boundary source, frame and the
/// sorted names of the countries attributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheKey {
    pub data_dir: PathBuf,
    pub emission_file: String,
    pub pollution_collection: String,
    pub season: Season,
    pub pollution_chemical: String,
    pub emission_chemical: String,
    pub emission_levels: LevelRange,
    pub emission_multiplier: f64,
    pub boundaries: PathBuf,
    pub name_field: String,
    pub frame: StudyFrame,
    pub countries: Vec<String>,
}

impl CacheKey {
    /// Replace the attributed countries, kept sorted so the key is order independent
    #[must_use]
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self.countries.sort();
        self.countries.dedup();
        self
    }


    /// File stem identifying the cache for these settings
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}",
            self.pollution_collection,
            self.season.tag(),
            self.pollution_chemical,
            self.emission_chemical,
            self.emission_levels.start,
            self.emission_levels.stop
        )
    }
}

/// Name of a pollution dataset following the `<collection>.<JAN|JUL>.<ON|OFF>.nc4` convention
#[must_use]
pub fn data_filename(collection: &str, season: Season, aircraft_on: bool) -> String {
    format!(
        "{collection}.{}.{}.nc4",
        season.tag(),
        if aircraft_on { "ON" } else { "OFF" }
    )
}

/// Complete description of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub emission_file: String,
    pub pollution_collection: String,
    pub emission_chemical: String,
    pub pollution_chemical: String,
    pub season: Season,
    pub emission_levels: LevelRange,
    pub statistic: Statistic,
    pub method: AggregationMethod,
    pub colour_scale: ColourScale,
    /// Countries whose name contains any of these strings are removed
    pub outliers: Vec<String>,
    /// Factor applied to the derived statistic
    pub multiplier: f64,
    /// Factor applied to the raw emission samples to stay clear of machine precision
    pub emission_multiplier: f64,
    pub boundaries: PathBuf,
    pub name_field: String,
    pub country_list: PathBuf,
    pub frame: StudyFrame,
    /// Directory for raw-data caches; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    pub recalculate: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            emission_file: "AvEmFluxes.nc4".to_string(),
            pollution_collection: "Soot.24h".to_string(),
            emission_chemical: "BC".to_string(),
            pollution_chemical: "AerMassBC".to_string(),
            season: Season::Summer,
            emission_levels: LevelRange::default(),
            statistic: Statistic::Ratio,
            method: AggregationMethod::AreaAverage,
            colour_scale: ColourScale::Linear,
            outliers: Vec::new(),
            multiplier: 1.0,
            emission_multiplier: 1.0,
            boundaries: PathBuf::from("Shapefiles/CNTR_RG_20M_2016_4326.shp"),
            name_field: "NAME_ENGL".to_string(),
            country_list: PathBuf::from("countries.json"),
            frame: StudyFrame::default(),
            cache_dir: Some(PathBuf::from("cache")),
            recalculate: false,
        }
    }
}

impl RunConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or fails
    /// [`RunConfig::validate`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`AeroCountryError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.emission_levels.start > self.emission_levels.stop {
            return Err(AeroCountryError::InvalidConfig {
                message: format!("emission levels {} are reversed", self.emission_levels),
            });
        }
        if !self.multiplier.is_finite() || self.multiplier == 0.0 {
            return Err(AeroCountryError::InvalidConfig {
                message: format!("multiplier must be finite and non-zero, got {}", self.multiplier),
            });
        }
        if !self.emission_multiplier.is_finite() || self.emission_multiplier == 0.0 {
            return Err(AeroCountryError::InvalidConfig {
                message: format!(
                    "emission multiplier must be finite and non-zero, got {}",
                    self.emission_multiplier
                ),
            });
        }
        let frame = &self.frame;
        if frame.min_lon >= frame.max_lon || frame.min_lat >= frame.max_lat {
            return Err(AeroCountryError::InvalidConfig {
                message: format!("study frame is empty: {frame:?}"),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn emission_path(&self) -> PathBuf {
        self.data_dir.join(&self.emission_file)
    }

    #[must_use]
    pub fn pollution_path(&self, aircraft_on: bool) -> PathBuf {
        self.data_dir
            .join(data_filename(&self.pollution_collection, self.season, aircraft_on))
    }

    /// Cache key of this run before the attributed countries are known
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            data_dir: self.data_dir.clone(),
            emission_file: self.emission_file.clone(),
            pollution_collection: self.pollution_collection.clone(),
            season: self.season,
            pollution_chemical: self.pollution_chemical.clone(),
            emission_chemical: self.emission_chemical.clone(),
            emission_levels: self.emission_levels,
            emission_multiplier: self.emission_multiplier,
            boundaries: self.boundaries.clone(),
            name_field: self.name_field.clone(),
            frame: self.frame,
            countries: Vec::new(),
        }
    }

    /// Location of the raw-data cache for this configuration, if caching is enabled
    #[must_use]
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", self.cache_key().file_stem())))
    }

    /// One-line description of the run used as a report subtitle
    #[must_use]
    pub fn sub_title(&self) -> String {
        let mut parts = Vec::new();
        if self.statistic.uses_pollution() {
            parts.push(format!("Pollution chemical: {}", self.pollution_chemical));
        }
        if self.statistic.uses_emissions() {
            parts.push(format!("Emission chemical: {}", self.emission_chemical));
        }
        parts.push(format!(
            "Time frame for pollution: {} 2005",
            self.season.month_name()
        ));
        parts.push(format!("Altitude levels for emission: {}", self.emission_levels));
        parts.push(format!("Averaging method: {}", self.method.label()));
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_range_parsing() {
        let range: LevelRange = "2:14".parse().unwrap();
        assert_eq!(range, LevelRange { start: 2, stop: 14 });
        assert!(range.contains(2.0));
        assert!(range.contains(14.0));
        assert!(!range.contains(14.5));
        assert!("8:2".parse::<LevelRange>().is_err());
        assert!("8".parse::<LevelRange>().is_err());
        assert!("a:b".parse::<LevelRange>().is_err());
    }

    #[test]
    fn file_naming_conventions() {
        assert_eq!(
            data_filename("Soot.24h", Season::Summer, true),
            "Soot.24h.JUL.ON.nc4"
        );
        assert_eq!(
            data_filename("Soot.24h", Season::Winter, false),
            "Soot.24h.JAN.OFF.nc4"
        );
        let config = RunConfig::default();
        assert_eq!(config.cache_key().file_stem(), "Soot.24h_JUL_AerMassBC_BC_0_8");
    }

    #[test]
    fn sub_title_depends_on_statistic() {
        let mut config = RunConfig::default();
        config.statistic = Statistic::Emissions;
        let title = config.sub_title();
        assert!(title.starts_with("Emission chemical: BC"));
        assert!(!title.contains("Pollution chemical"));
        assert!(title.contains("July 2005"));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{"season": "winter", "outliers": ["Iraq"]}"#).unwrap();
        assert_eq!(config.season, Season::Winter);
        assert_eq!(config.outliers, vec!["Iraq".to_string()]);
        assert_eq!(config.emission_file, "AvEmFluxes.nc4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_multiplier() {
        let config = RunConfig {
            multiplier: 0.0,
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AeroCountryError::InvalidConfig { .. })
        ));
    }
}
