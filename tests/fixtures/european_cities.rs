//! City coordinates and road distances for test fixtures.
//!
//! Coordinates are city centres; road distances are typical driving
//! distances in kilometers.

use std::collections::HashMap;

use haul_distance::coords::CoordinateStore;
use haul_distance::geo::Coordinate;
use haul_distance::table::PrecomputedTable;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

// ============================================================================
// Domestic cities
// ============================================================================

pub const DOMESTIC: &[City] = &[
    City::new("Frankfurt", 50.1109, 8.6821),
    City::new("Munich", 48.1351, 11.5820),
    City::new("Berlin", 52.5200, 13.4050),
    City::new("Hamburg", 53.5511, 9.9937),
    City::new("Cologne", 50.9375, 6.9603),
];

// ============================================================================
// International cities
// ============================================================================

pub const INTERNATIONAL: &[City] = &[
    City::new("Paris", 48.8566, 2.3522),
    City::new("Vienna", 48.2082, 16.3738),
    City::new("Lisbon", 38.7223, -9.1393),
    City::new("Moscow", 55.7558, 37.6173),
];

// ============================================================================
// Road distances (one direction only)
// ============================================================================

pub const ROAD_DISTANCES: &[(&str, &str, f64)] = &[
    ("Frankfurt", "Munich", 392.0),
    ("Berlin", "Hamburg", 289.0),
    ("Cologne", "Frankfurt", 190.0),
    ("Munich", "Vienna", 434.0),
];

pub fn coordinate_store() -> CoordinateStore {
    let coords: HashMap<String, Coordinate> = DOMESTIC
        .iter()
        .chain(INTERNATIONAL)
        .map(|city| (city.name.to_string(), city.coordinate()))
        .collect();
    CoordinateStore::new(coords)
}

pub fn distance_table() -> PrecomputedTable {
    let mut table = PrecomputedTable::new();
    for (origin, destination, km) in ROAD_DISTANCES {
        table.insert(origin, destination, *km);
    }
    table
}
