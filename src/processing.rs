//! Derivation of one value per country from its raw samples
//!
//! The samples of a country are first reduced with an [`AggregationMethod`] and
//! then combined into the selected [`Statistic`]. Countries that would divide
//! by zero, and countries flagged as outliers, are removed and reported.

use crate::aggregation::RawCountryData;
use crate::config::{AggregationMethod, Statistic};
use crate::geometry::CountryPolygons;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Final per-country values and the countries left out of them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedData {
    pub values: BTreeMap<String, f64>,
    /// Removed for a zero divisor or as an outlier; countries without data are not listed
    pub removed: Vec<String>,
}

/// Options for [`process_data`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions<'a> {
    pub method: AggregationMethod,
    pub statistic: Statistic,
    pub outliers: &'a [String],
    pub multiplier: f64,
}

/// Reduce a sample list to one value
#[must_use]
pub fn aggregate(samples: &[f64], method: AggregationMethod) -> f64 {
    match method {
        AggregationMethod::AreaAverage => samples.iter().sum(),
        AggregationMethod::Median => median(samples),
    }
}

fn median(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// A country is an outlier if its name contains any of the outlier patterns
#[must_use]
pub fn is_outlier(country: &str, outliers: &[String]) -> bool {
    outliers.iter().any(|pattern| country.contains(pattern.as_str()))
}

/// Compute the selected statistic for every country in `raw`
#[must_use]
pub fn process_data(
    polygons: &CountryPolygons,
    raw: &RawCountryData,
    options: &ProcessingOptions<'_>,
) -> ProcessedData {
    let mut processed = ProcessedData::default();

    for (country, samples) in raw {
        let emission = aggregate(&samples.emission, options.method);
        let pollution = aggregate(&samples.pollution, options.method);

        if is_outlier(country, options.outliers) {
            debug!(country = %country, "Removed as outlier");
            processed.removed.push(country.clone());
            continue;
        }

        let value = match options.statistic {
            Statistic::Ratio => {
                if emission == 0.0 {
                    debug!(country = %country, "Removed: zero emissions");
                    processed.removed.push(country.clone());
                    continue;
                }
                pollution * options.multiplier / emission
            }
            Statistic::Emissions | Statistic::Pollution => {
                let Some(region) = polygons.get(country) else {
                    debug!(country = %country, "Removed: no polygon for cached country");
                    processed.removed.push(country.clone());
                    continue;
                };
                let aggregate = if options.statistic == Statistic::Emissions {
                    emission
                } else {
                    pollution
                };
                aggregate * options.multiplier / region.area_km2()
            }
        };
        processed.values.insert(country.clone(), value);
    }

    info!(
        statistic = options.statistic.title(),
        countries = processed.values.len(),
        removed = processed.removed.len(),
        "Processed country data"
    );
    processed
}

/// Mapping of values onto `[0, 1]` for colour coding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ColourScale {
    Linear,
    Sqrt,
    Log,
}

impl ColourScale {
    /// Map `value` from `[min, max]` onto `[0, 1]`; a zero-width range maps to 0
    #[must_use]
    pub fn map(self, value: f64, min: f64, max: f64) -> f64 {
        if max <= min {
            return 0.0;
        }
        let linear = (value - min) / (max - min);
        match self {
            Self::Linear => linear,
            Self::Sqrt => linear.sqrt(),
            Self::Log => (linear + 1.0).ln() / 2.0_f64.ln(),
        }
    }
}

/// Normalise all values with `scale` relative to their own minimum and maximum
#[must_use]
pub fn normalise(values: &BTreeMap<String, f64>, scale: ColourScale) -> BTreeMap<String, f64> {
    let min = values.values().copied().fold(f64::INFINITY, f64::min);
    let max = values.values().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|(name, &value)| (name.clone(), scale.map(value, min, max)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_and_odd_lengths() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn outliers_match_by_substring() {
        let outliers = vec!["Iraq".to_string(), "Israel".to_string()];
        assert!(is_outlier("Iraq", &outliers));
        assert!(!is_outlier("Iran", &outliers));
        let russia = vec!["Russia".to_string()];
        assert!(is_outlier("Russian Federation", &russia));
    }

    #[test]
    fn colour_scales_hit_end_points() {
        for scale in [ColourScale::Linear, ColourScale::Sqrt, ColourScale::Log] {
            assert_eq!(scale.map(2.0, 2.0, 6.0), 0.0);
            assert!((scale.map(6.0, 2.0, 6.0) - 1.0).abs() < 1e-12);
        }
        assert_eq!(ColourScale::Sqrt.map(3.0, 2.0, 6.0), 0.5);
        assert_eq!(ColourScale::Linear.map(5.0, 5.0, 5.0), 0.0);
    }
}
