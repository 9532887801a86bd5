//! haul-distance
//!
//! Answers "how far apart are A and B" from layered in-memory sources
//! (cache, precomputed table, geodesic, heuristic) with optional
//! asynchronous enrichment from online routing providers.

pub mod cache;
pub mod config;
pub mod coords;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod heuristic;
pub mod store;
pub mod table;

pub use cache::DistanceCache;
pub use config::{EngineConfig, EngineOptions};
pub use engine::{DistanceEngine, MAX_PLAUSIBLE_KM, Resolution, Source};
pub use enrich::{DistanceProvider, Enricher, Place};
pub use store::{FileStore, KeyValueStore, MemoryStore};
