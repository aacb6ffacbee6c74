//! Country regions clipped to the study frame

use super::boundaries::Boundary;
use crate::config::StudyFrame;
use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Contains, Coord, GeodesicArea, MultiPolygon, Point,
    Polygon, Rect,
};
use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;
use tracing::{debug, info};

/// The part of one country that lies inside the study frame
#[derive(Debug, Clone)]
pub struct CountryRegion {
    shape: MultiPolygon<f64>,
    bounds: Vec<Rect<f64>>,
    area_km2: f64,
}

impl CountryRegion {
    /// Build a region from its polygons, dropping empty ones
    ///
    /// Returns `None` when no polygon with a non-zero area remains.
    #[must_use]
    pub fn from_parts(parts: Vec<Polygon<f64>>) -> Option<Self> {
        let parts: Vec<Polygon<f64>> = parts
            .into_iter()
            .filter(|part| part.unsigned_area() > 0.0)
            .collect();
        if parts.is_empty() {
            return None;
        }

        let bounds = parts.iter().filter_map(|part| part.bounding_rect()).collect();
        let area_km2 = parts
            .iter()
            .map(|part| part.geodesic_area_unsigned() / 1e6)
            .sum();

        Some(Self {
            shape: MultiPolygon::new(parts),
            bounds,
            area_km2,
        })
    }

    #[must_use]
    pub fn parts(&self) -> &[Polygon<f64>] {
        &self.shape.0
    }

    /// Surface area on the WGS84 ellipsoid, in km²
    #[must_use]
    pub fn area_km2(&self) -> f64 {
        self.area_km2
    }

    /// Strict containment test; points on a border are outside
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let point = Point::new(lon, lat);
        self.parts()
            .iter()
            .zip(&self.bounds)
            .any(|(part, rect)| in_rect(rect, lon, lat) && part.contains(&point))
    }

    /// Planar centroid of all parts weighted by their area, in degrees
    #[must_use]
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.shape.centroid()
    }

    /// Radius of a circle with the same area as the region, in km
    #[must_use]
    pub fn characteristic_radius_km(&self) -> f64 {
        (self.area_km2 / PI).sqrt()
    }
}

fn in_rect(rect: &Rect<f64>, lon: f64, lat: f64) -> bool {
    let (min, max) = (rect.min(), rect.max());
    lon >= min.x && lon <= max.x && lat >= min.y && lat <= max.y
}

/// Named country regions in alphabetical order
#[derive(Debug, Clone, Default)]
pub struct CountryPolygons {
    regions: BTreeMap<String, CountryRegion>,
}

impl CountryPolygons {
    /// Build the polygon set for the `wanted` countries, clipped to `frame`
    ///
    /// Boundary records sharing a name are merged. Wanted countries without any
    /// area inside the frame are left out.
    #[must_use]
    pub fn build(boundaries: &[Boundary], wanted: &[String], frame: &StudyFrame) -> Self {
        let wanted: HashSet<&str> = wanted.iter().map(String::as_str).collect();
        let frame_polygon = Rect::new(
            Coord {
                x: frame.min_lon,
                y: frame.min_lat,
            },
            Coord {
                x: frame.max_lon,
                y: frame.max_lat,
            },
        )
        .to_polygon();

        let mut parts: BTreeMap<String, Vec<Polygon<f64>>> = BTreeMap::new();
        for boundary in boundaries {
            if !wanted.contains(boundary.name.as_str()) {
                continue;
            }
            let clipped = parts.entry(boundary.name.clone()).or_default();
            for polygon in &boundary.shape {
                clipped.extend(polygon.intersection(&frame_polygon));
            }
        }

        let mut regions = BTreeMap::new();
        for (name, country_parts) in parts {
            match CountryRegion::from_parts(country_parts) {
                Some(region) => {
                    regions.insert(name, region);
                }
                None => debug!(country = %name, "No area inside the study frame"),
            }
        }

        info!(
            requested = wanted.len(),
            inside_frame = regions.len(),
            "Created country polygons"
        );
        Self { regions }
    }

    /// Assemble a polygon set from already prepared regions
    pub fn from_regions<I>(regions: I) -> Self
    where
        I: IntoIterator<Item = (String, CountryRegion)>,
    {
        Self {
            regions: regions.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CountryRegion> {
        self.regions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CountryRegion)> {
        self.regions.iter().map(|(name, region)| (name.as_str(), region))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
