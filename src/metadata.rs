//! Dataset inspection: which chemical species a NetCDF file offers
//!
//! Coordinate variables are filtered out so that only selectable data
//! variables (emission or concentration fields) remain.

use crate::errors::Result;
use netcdf::{AttributeValue, File};
use std::path::Path;

/// Variables that describe the grid rather than a chemical species
pub const COORDINATE_VARIABLES: [&str; 5] = ["lev", "ilev", "lon", "lat", "time"];

/// Description of a data variable
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesInfo {
    pub name: String,
    pub dimensions: Vec<(String, usize)>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// List the data variables of an open NetCDF file, sorted by name
#[must_use]
pub fn list_species(file: &File) -> Vec<SpeciesInfo> {
    let mut species: Vec<SpeciesInfo> = file
        .variables()
        .filter(|var| !COORDINATE_VARIABLES.contains(&var.name().as_str()))
        .map(|var| SpeciesInfo {
            name: var.name(),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| (d.name().to_string(), d.len()))
                .collect(),
            units: string_attribute(&var, "units"),
            long_name: string_attribute(&var, "long_name"),
        })
        .collect();
    species.sort_by(|a, b| a.name.cmp(&b.name));
    species
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

/// Print the species of the NetCDF file at `path`
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn print_species(path: &Path) -> Result<()> {
    let file = netcdf::open(path)?;
    let species = list_species(&file);

    println!("\n Species in {}", path.display());
    println!("==============");

    if species.is_empty() {
        println!("   (No data variables found)");
        return Ok(());
    }

    for info in species {
        let dims: Vec<String> = info
            .dimensions
            .iter()
            .map(|(name, len)| format!("{name}[{len}]"))
            .collect();
        println!("    {} ({})", info.name, dims.join(", "));

        let mut key_attrs = Vec::new();
        if let Some(units) = &info.units {
            key_attrs.push(format!("units: {units}"));
        }
        if let Some(long_name) = &info.long_name {
            key_attrs.push(format!("long_name: {long_name}"));
        }
        if !key_attrs.is_empty() {
            println!("      └─ {}", key_attrs.join(", "));
        }
    }

    println!("\n💡 Tip: Use --emission-chemical / --pollution-chemical to select a species");
    Ok(())
}
