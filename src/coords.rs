//! Location name to coordinate lookup.
//!
//! Loaded once at startup and read-only afterwards. Names are matched
//! byte-for-byte; no case folding or fuzzy matching.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geo::Coordinate;

const BUILTIN_COORDINATES: &str = include_str!("../data/coordinates.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateStore {
    coordinates: HashMap<String, Coordinate>,
}

impl CoordinateStore {
    pub fn new(coordinates: HashMap<String, Coordinate>) -> Self {
        Self { coordinates }
    }

    /// The coordinate set compiled into the crate.
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_json(BUILTIN_COORDINATES)
    }

    /// Parse a `name -> {lat, lon}` JSON object.
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

    pub fn get(&self, name: &str) -> Option<Coordinate> {
        self.coordinates.get(name).copied()
    }

    pub fn has_coordinates(&self, name: &str) -> bool {
        self.coordinates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.coordinates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Coordinate)> {
        self.coordinates.iter().map(|(name, coord)| (name.as_str(), *coord))
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
