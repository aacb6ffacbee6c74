//! JSON cache for raw per-country data
//!
//! Reading the NetCDF datasets and attributing every grid cell is the slow
//! part of a run. Its result only depends on the [`CacheKey`], so it is written
//! to a JSON file together with the key and reused by later runs with the same
//! key. A missing, unreadable or mismatching cache is never an error: the data
//! is simply recomputed.

use crate::aggregation::RawCountryData;
use crate::config::CacheKey;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// On-disk layout of a cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheFile {
    pub parameters: CacheKey,
    pub countries: RawCountryData,
}

/// Where the raw data of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Cached,
    Computed,
}

/// Read the cache at `path` if it was produced with `key`
#[must_use]
pub fn load(path: &Path, key: &CacheKey) -> Option<RawCountryData> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            info!(path = %path.display(), "No cache file found, recalculating data");
            return None;
        }
    };

    let cache: CacheFile = match serde_json::from_reader(BufReader::new(file)) {
        Ok(cache) => cache,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable cache file, recalculating data");
            return None;
        }
    };

    if cache.parameters != *key {
        info!(
            path = %path.display(),
            "Parameters in cache file don't match the run configuration, recalculating data"
        );
        return None;
    }

    info!(path = %path.display(), countries = cache.countries.len(), "Retrieved data from cache");
    Some(cache.countries)
}

/// Write `data` with its `key` to `path`, creating parent directories
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn store(path: &Path, key: &CacheKey, data: &RawCountryData) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let cache = CacheFile {
        parameters: key.clone(),
        countries: data.clone(),
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &cache)?;
    writer.flush()?;

    info!(path = %path.display(), "Wrote cache file");
    Ok(())
}

/// Return cached data for `key`, or run `compute` and cache its result
///
/// With `path == None` caching is disabled. `recalculate` skips the lookup but
/// still refreshes the cache. Failing to write the cache only logs a warning.
///
/// # Errors
///
/// Propagates errors from `compute`.
pub fn load_or_compute<F>(
    path: Option<&Path>,
    key: &CacheKey,
    recalculate: bool,
    compute: F,
) -> Result<(RawCountryData, Provenance)>
where
    F: FnOnce() -> Result<RawCountryData>,
{
    if let Some(path) = path {
        if !recalculate {
            if let Some(data) = load(path, key) {
                return Ok((data, Provenance::Cached));
            }
        }
    }

    let data = compute()?;

    if let Some(path) = path {
        if let Err(e) = store(path, key, &data) {
            warn!(path = %path.display(), error = %e, "Could not write cache file");
        }
    }

    Ok((data, Provenance::Computed))
}
