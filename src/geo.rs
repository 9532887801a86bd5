//! Great-circle distance between coordinates.
//!
//! Uses the Haversine formula on a spherical Earth. Ignores roads, so it
//! sits below the precomputed table and the cache in resolution order.

use serde::{Deserialize, Serialize};

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Haversine distance between two points in kilometers, unrounded.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Round a kilometer value to one decimal place.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Haversine distance rounded to one decimal, as served and cached.
pub fn geodesic_km(from: Coordinate, to: Coordinate) -> f64 {
    round_km(haversine_km(from, to))
}
