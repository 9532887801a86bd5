//! Precomputed origin/destination distances.
//!
//! Stored as `origin -> destination -> km`. Only one direction needs to be
//! present; [`PrecomputedTable::lookup`] tries `from -> to` first, then the
//! reverse. If both directions exist with different values the forward entry
//! wins and nothing reconciles them.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::coords::CoordinateStore;
use crate::error::EngineError;
use crate::geo::geodesic_km;

const BUILTIN_TABLE: &str = include_str!("../data/distances.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecomputedTable {
    distances: HashMap<String, HashMap<String, f64>>,
}

impl PrecomputedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table compiled into the crate.
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| EngineError::AssetRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Write the table as JSON with sorted keys so regenerated files diff cleanly.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let sorted: BTreeMap<&str, BTreeMap<&str, f64>> = self
            .distances
            .iter()
            .map(|(origin, row)| {
                (
                    origin.as_str(),
                    row.iter().map(|(dest, km)| (dest.as_str(), *km)).collect(),
                )
            })
            .collect();
        let data = serde_json::to_string_pretty(&sorted)?;
        fs::write(path, data)
    }

    pub fn insert(&mut self, origin: &str, destination: &str, km: f64) {
        self.distances
            .entry(origin.to_string())
            .or_default()
            .insert(destination.to_string(), km);
    }

    /// Direction-insensitive lookup; forward entry first.
    pub fn lookup(&self, from: &str, to: &str) -> Option<f64> {
        self.get_directed(from, to)
            .or_else(|| self.get_directed(to, from))
    }

    fn get_directed(&self, origin: &str, destination: &str) -> Option<f64> {
        self.distances.get(origin)?.get(destination).copied()
    }

    /// Every name that appears as an origin or a destination.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.distances.iter().flat_map(|(origin, row)| {
            std::iter::once(origin.as_str()).chain(row.keys().map(String::as_str))
        })
    }

    pub fn contains_location(&self, name: &str) -> bool {
        self.distances.contains_key(name)
            || self.distances.values().any(|row| row.contains_key(name))
    }

    /// Number of stored directed entries.
    pub fn len(&self) -> usize {
        self.distances.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offline generation: geodesic distance for every unordered pair of
    /// coordinate-bearing locations, one direction each (lexicographically
    /// smaller name as origin). Pairs beyond `max_km` are left out.
    pub fn from_coordinates(store: &CoordinateStore, max_km: f64) -> Self {
        let mut points: Vec<_> = store.iter().collect();
        points.sort_by(|a, b| a.0.cmp(b.0));

        let pairs: Vec<(usize, usize)> = (0..points.len())
            .flat_map(|i| ((i + 1)..points.len()).map(move |j| (i, j)))
            .collect();

        let rows: Vec<(&str, &str, f64)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let (origin, from) = points[i];
                let (destination, to) = points[j];
                (origin, destination, geodesic_km(from, to))
            })
            .filter(|(_, _, km)| *km <= max_km)
            .collect();

        let mut table = Self::new();
        for (origin, destination, km) in rows {
            table.insert(origin, destination, km);
        }
        table
    }
}
