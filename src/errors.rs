//! Centralized error handling for aerocountry
//!
//! Every fallible operation in the crate returns [`Result`], so file, geometry and
//! statistics failures can be told apart by the caller.

use std::fmt;
use std::path::PathBuf;

/// Main error type for aerocountry operations
#[derive(Debug)]
pub enum AeroCountryError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// JSON (de)serialization errors for configuration, country lists and caches
    JsonError(serde_json::Error),

    /// GeoJSON boundary file errors
    GeoJsonError(geojson::Error),

    /// ESRI shapefile boundary errors
    ShapefileError(shapefile::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Dimension not found in variable
    DimensionNotFound { var: String, dim: String },

    /// Emission and pollution grids do not line up
    GridMismatch { message: String },

    /// Boundary file has an unsupported extension or unusable content
    InvalidBoundaries { path: PathBuf, message: String },

    /// Invalid run configuration value
    InvalidConfig { message: String },

    /// Statistic undefined for the given input (zero variance, too few values, ...)
    DegenerateStatistic { statistic: &'static str, reason: String },

    /// Thread pool configuration error
    ThreadPoolError(String),
}

impl fmt::Display for AeroCountryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AeroCountryError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            AeroCountryError::IoError(e) => write!(f, "I/O error: {}", e),
            AeroCountryError::JsonError(e) => write!(f, "JSON error: {}", e),
            AeroCountryError::GeoJsonError(e) => write!(f, "GeoJSON error: {}", e),
            AeroCountryError::ShapefileError(e) => write!(f, "Shapefile error: {}", e),
            AeroCountryError::ArrayError(e) => write!(f, "Array error: {}", e),
            AeroCountryError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            AeroCountryError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            AeroCountryError::GridMismatch { message } => write!(f, "Grid mismatch: {}", message),
            AeroCountryError::InvalidBoundaries { path, message } => {
                write!(f, "Invalid boundary file '{}': {}", path.display(), message)
            }
            AeroCountryError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            AeroCountryError::DegenerateStatistic { statistic, reason } => {
                write!(f, "{} is undefined: {}", statistic, reason)
            }
            AeroCountryError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
        }
    }
}

impl std::error::Error for AeroCountryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AeroCountryError::NetCDFError(e) => Some(e),
            AeroCountryError::IoError(e) => Some(e),
            AeroCountryError::JsonError(e) => Some(e),
            AeroCountryError::GeoJsonError(e) => Some(e),
            AeroCountryError::ShapefileError(e) => Some(e),
            AeroCountryError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for AeroCountryError {
    fn from(error: netcdf::Error) -> Self {
        AeroCountryError::NetCDFError(error)
    }
}

impl From<std::io::Error> for AeroCountryError {
    fn from(error: std::io::Error) -> Self {
        AeroCountryError::IoError(error)
    }
}

impl From<serde_json::Error> for AeroCountryError {
    fn from(error: serde_json::Error) -> Self {
        AeroCountryError::JsonError(error)
    }
}

impl From<geojson::Error> for AeroCountryError {
    fn from(error: geojson::Error) -> Self {
        AeroCountryError::GeoJsonError(error)
    }
}

impl From<shapefile::Error> for AeroCountryError {
    fn from(error: shapefile::Error) -> Self {
        AeroCountryError::ShapefileError(error)
    }
}

impl From<ndarray::ShapeError> for AeroCountryError {
    fn from(error: ndarray::ShapeError) -> Self {
        AeroCountryError::ArrayError(error)
    }
}

/// Result type alias for aerocountry operations
pub type Result<T> = std::result::Result<T, AeroCountryError>;
