//! Results of an analysis run
//!
//! [`AnalysisReport`] collects everything a run produces. It serialises to JSON
//! for downstream plotting and prints a console summary.

use crate::cache::Provenance;
use crate::errors::Result;
use crate::spatial::SpatialSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// RFC 3339 time the report was produced
    pub generated_at: String,
    pub title: String,
    pub subtitle: String,
    pub provenance: Provenance,
    /// Number of countries inside the study frame
    pub countries_total: usize,
    /// Countries without any grid cell
    pub unavailable: Vec<String>,
    /// Countries removed for a zero divisor or as outliers
    pub removed: Vec<String>,
    pub values: BTreeMap<String, f64>,
    /// `values` mapped onto `[0, 1]` with the configured colour scale
    pub normalised: BTreeMap<String, f64>,
    /// `None` when the statistics are undefined for these values
    pub spatial: Option<SpatialSummary>,
}

impl AnalysisReport {
    /// Write the report as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!(path = %path.display(), "Wrote report");
        Ok(())
    }

    pub fn print(&self) {
        println!("\n {}", self.title);
        println!("==============================");
        println!("   {}", self.subtitle);
        println!(
            "   Raw data: {}",
            match self.provenance {
                Provenance::Cached => "loaded from cache",
                Provenance::Computed => "computed from datasets",
            }
        );
        println!(
            "   Countries: {} in frame, {} with values",
            self.countries_total,
            self.values.len()
        );

        if !self.unavailable.is_empty() {
            println!("\n⚠ Countries with unavailable data:");
            println!("   {}", self.unavailable.join(", "));
        }
        if !self.removed.is_empty() {
            println!("\n Removed countries:");
            println!("   {}", self.removed.join(", "));
        }

        if self.values.is_empty() {
            println!("\n   (No country values)");
            return;
        }

        let width = self.values.keys().map(String::len).max().unwrap_or(0);
        let local = self.spatial.as_ref().map(|s| &s.morans_i_local);
        println!("\n Country values:");
        for (country, value) in &self.values {
            let scaled = self.normalised.get(country).copied().unwrap_or(0.0);
            match local.and_then(|l| l.get(country)) {
                Some(li) => println!(
                    "    {country:<width$}  {value:>12.4e}  scaled {scaled:.3}  local I {li:>8.4}"
                ),
                None => println!("    {country:<width$}  {value:>12.4e}  scaled {scaled:.3}"),
            }
        }

        match &self.spatial {
            Some(spatial) => {
                println!("\n Spatial autocorrelation:");
                println!("    Global Moran's I: {:.4}", spatial.morans_i_global);
                println!("    Geary's C:        {:.4}", spatial.gearys_c);
            }
            None => println!("\n⚠ Spatial autocorrelation undefined for these values"),
        }
    }
}
