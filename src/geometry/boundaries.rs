//! Country boundary input
//!
//! Boundaries are read either from an ESRI shapefile (`.shp`, with its `.dbf`
//! attribute table next to it) or from a GeoJSON feature collection. In both
//! cases the country name is taken from a configurable attribute, `NAME_ENGL`
//! for the Eurostat country files.

use crate::errors::{AeroCountryError, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, PolygonType};
use shapefile::dbase::{FieldValue, Record};
use shapefile::PolygonRing;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outline of one named boundary record
#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub shape: MultiPolygon<f64>,
}

/// Load all boundary records from `path`, dispatching on the file extension
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if its extension is
/// neither `shp`, `geojson` nor `json`.
pub fn load_boundaries(path: &Path, name_field: &str) -> Result<Vec<Boundary>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let boundaries = match extension.as_deref() {
        Some("shp") => load_shapefile(path, name_field)?,
        Some("geojson" | "json") => load_geojson(path, name_field)?,
        _ => {
            return Err(AeroCountryError::InvalidBoundaries {
                path: path.to_path_buf(),
                message: "expected a .shp, .geojson or .json file".to_string(),
            })
        }
    };

    info!(
        path = %path.display(),
        records = boundaries.len(),
        "Loaded country boundaries"
    );
    Ok(boundaries)
}

/// Read the JSON list of country names to analyse
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a JSON array of strings.
pub fn load_country_list(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let names: Vec<String> = serde_json::from_reader(reader)?;
    debug!(count = names.len(), "Loaded country list");
    Ok(names)
}

fn load_shapefile(path: &Path, name_field: &str) -> Result<Vec<Boundary>> {
    let records = shapefile::read_as::<_, shapefile::Polygon, Record>(path)?;

    let mut boundaries = Vec::with_capacity(records.len());
    for (polygon, record) in records {
        let name = match record.get(name_field) {
            Some(FieldValue::Character(Some(value)) | FieldValue::Memo(value)) => clean_name(value),
            _ => String::new(),
        };
        if name.is_empty() {
            warn!(field = name_field, "Skipping shapefile record without a name");
            continue;
        }

        let rings = polygon.rings().iter().map(|ring| match ring {
            PolygonRing::Outer(points) => (true, points_to_coords(points)),
            PolygonRing::Inner(points) => (false, points_to_coords(points)),
        });

        boundaries.push(Boundary {
            name,
            shape: MultiPolygon::new(assemble_polygons(rings)),
        });
    }

    Ok(boundaries)
}

fn points_to_coords(points: &[shapefile::Point]) -> Vec<Coord<f64>> {
    points.iter().map(|p| Coord { x: p.x, y: p.y }).collect()
}

fn load_geojson(path: &Path, name_field: &str) -> Result<Vec<Boundary>> {
    let reader = BufReader::new(File::open(path)?);
    let features = match GeoJson::from_reader(reader)? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(AeroCountryError::InvalidBoundaries {
                path: path.to_path_buf(),
                message: "bare geometry has no name attribute".to_string(),
            })
        }
    };

    let mut boundaries = Vec::with_capacity(features.len());
    for feature in features {
        let Some(name) = feature
            .property(name_field)
            .and_then(|value| value.as_str())
            .map(clean_name)
        else {
            warn!(field = name_field, "Skipping GeoJSON feature without a name");
            continue;
        };

        let Some(geometry) = feature.geometry else {
            debug!(country = %name, "Skipping GeoJSON feature without geometry");
            continue;
        };

        let polygons = match geometry.value {
            geojson::Value::Polygon(rings) => polygon_from_geojson(&rings),
            geojson::Value::MultiPolygon(polygons) => {
                polygons.iter().flat_map(|p| polygon_from_geojson(p)).collect()
            }
            _ => {
                warn!(country = %name, "Skipping non-polygonal GeoJSON geometry");
                continue;
            }
        };

        boundaries.push(Boundary {
            name,
            shape: MultiPolygon::new(polygons),
        });
    }

    Ok(boundaries)
}

fn polygon_from_geojson(rings: &PolygonType) -> Vec<Polygon<f64>> {
    let rings = rings.iter().enumerate().map(|(i, ring)| {
        let coords = ring
            .iter()
            .filter(|position| position.len() >= 2)
            .map(|position| Coord {
                x: position[0],
                y: position[1],
            })
            .collect();
        (i == 0, coords)
    });
    assemble_polygons(rings)
}

/// Build polygons from a ring sequence: every outer ring opens a new polygon and
/// the inner rings that follow become its holes.
fn assemble_polygons<I>(rings: I) -> Vec<Polygon<f64>>
where
    I: IntoIterator<Item = (bool, Vec<Coord<f64>>)>,
{
    let mut polygons = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for (is_outer, coords) in rings {
        if coords.len() < 3 {
            continue;
        }
        if is_outer {
            if let Some(outer) = exterior.take() {
                polygons.push(Polygon::new(outer, std::mem::take(&mut holes)));
            }
            exterior = Some(LineString::new(coords));
        } else if exterior.is_some() {
            holes.push(LineString::new(coords));
        }
    }

    if let Some(outer) = exterior {
        polygons.push(Polygon::new(outer, holes));
    }
    polygons
}

/// Names in dBASE tables are padded with NUL bytes
fn clean_name(raw: &str) -> String {
    raw.split('\0').next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dbase_padding() {
        assert_eq!(clean_name("Netherlands\0\0\0\0"), "Netherlands");
        assert_eq!(clean_name("  Malta "), "Malta");
    }

    #[test]
    fn inner_rings_attach_to_previous_outer() {
        let square = |o: f64, s: f64| {
            vec![
                Coord { x: o, y: o },
                Coord { x: o + s, y: o },
                Coord { x: o + s, y: o + s },
                Coord { x: o, y: o + s },
                Coord { x: o, y: o },
            ]
        };
        let polygons = assemble_polygons(vec![
            (true, square(0.0, 10.0)),
            (false, square(2.0, 2.0)),
            (true, square(20.0, 5.0)),
        ]);
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].interiors().len(), 1);
        assert!(polygons[1].interiors().is_empty());
    }
}
