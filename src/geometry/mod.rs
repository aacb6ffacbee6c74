//! Country geometry: boundary input, clipped country regions and map projection
//!
//! # Organization
//!
//! - [`boundaries`]: reading country outlines from ESRI shapefiles or GeoJSON
//! - [`region`]: per-country polygon sets clipped to the study frame
//! - [`projection`]: ETRS89 Lambert Azimuthal Equal Area projection

pub mod boundaries;
pub mod projection;
pub mod region;

pub use boundaries::{load_boundaries, load_country_list, Boundary};
pub use projection::{etrs89_laea, LambertAzimuthalEqualArea};
pub use region::{CountryPolygons, CountryRegion};
