//! Attribution of grid cells to countries
//!
//! Each cell centre is tested against every country in alphabetical order and
//! assigned to the first one that contains it. Cells outside all countries are
//! dropped. The lookup of individual cells runs on the rayon pool; the result
//! keeps the longitude-major cell order of a sequential scan.

use crate::geometry::CountryPolygons;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Index of a cell in the data grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub lon_idx: usize,
    pub lat_idx: usize,
}

/// Find the country containing `(lon, lat)`
///
/// Returns `None` if the point does not lie strictly inside any country.
#[must_use]
pub fn find_country(polygons: &CountryPolygons, lon: f64, lat: f64) -> Option<&str> {
    polygons
        .iter()
        .find(|(_, region)| region.contains(lon, lat))
        .map(|(name, _)| name)
}

/// Grid cells per country, each list in scan order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryCells {
    cells: BTreeMap<String, Vec<GridCell>>,
}

impl CountryCells {
    #[must_use]
    pub fn get(&self, country: &str) -> Option<&[GridCell]> {
        self.cells.get(country).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GridCell])> {
        self.cells
            .iter()
            .map(|(name, cells)| (name.as_str(), cells.as_slice()))
    }

    /// Number of countries with at least one cell
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of attributed cells
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}

/// Attribute every cell of a `lons` x `lats` grid to a country
#[must_use]
pub fn attribute_grid(polygons: &CountryPolygons, lons: &[f64], lats: &[f64]) -> CountryCells {
    let grid: Vec<GridCell> = (0..lons.len())
        .flat_map(|lon_idx| (0..lats.len()).map(move |lat_idx| GridCell { lon_idx, lat_idx }))
        .collect();

    debug!(
        cells = grid.len(),
        countries = polygons.len(),
        threads = rayon::current_num_threads(),
        "Attributing grid cells"
    );

    let owners: Vec<Option<&str>> = grid
        .par_iter()
        .map(|cell| find_country(polygons, lons[cell.lon_idx], lats[cell.lat_idx]))
        .collect();

    let mut cells: BTreeMap<String, Vec<GridCell>> = BTreeMap::new();
    for (cell, owner) in grid.into_iter().zip(owners) {
        if let Some(country) = owner {
            cells.entry(country.to_string()).or_default().push(cell);
        }
    }

    let result = CountryCells { cells };
    info!(
        attributed = result.cell_count(),
        countries = result.len(),
        "Assigned grid cells to countries"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CountryRegion;
    use geo::polygon;

    fn polygons() -> CountryPolygons {
        let west = polygon![(x: 0.0, y: 40.0), (x: 5.0, y: 40.0), (x: 5.0, y: 45.0), (x: 0.0, y: 45.0)];
        let east = polygon![(x: 5.0, y: 40.0), (x: 10.0, y: 40.0), (x: 10.0, y: 45.0), (x: 5.0, y: 45.0)];
        CountryPolygons::from_regions(vec![
            ("West".to_string(), CountryRegion::from_parts(vec![west]).unwrap()),
            ("East".to_string(), CountryRegion::from_parts(vec![east]).unwrap()),
        ])
    }

    #[test]
    fn grid_cells_follow_longitude_major_order() {
        let polygons = polygons();
        let lons = [2.5, 7.5, 12.5];
        let lats = [41.0, 43.0];
        let cells = attribute_grid(&polygons, &lons, &lats);

        assert_eq!(cells.len(), 2);
        assert_eq!(cells.cell_count(), 4);
        assert_eq!(
            cells.get("West").unwrap(),
            &[
                GridCell { lon_idx: 0, lat_idx: 0 },
                GridCell { lon_idx: 0, lat_idx: 1 }
            ]
        );
        assert_eq!(cells.get("East").unwrap()[1], GridCell { lon_idx: 1, lat_idx: 1 });
    }

    #[test]
    fn shared_border_belongs_to_nobody() {
        let polygons = polygons();
        assert_eq!(find_country(&polygons, 5.0, 42.0), None);
    }
}
