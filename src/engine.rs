//! Distance resolution facade.
//!
//! [`DistanceEngine::resolve_distance`] answers synchronously from in-memory
//! state only, trying in order: same-location haul, cache, precomputed
//! table, geodesic, heuristic. Whatever comes out is dropped if it falls
//! outside `0..=MAX_PLAUSIBLE_KM`.
//!
//! [`DistanceEngine::warm_distance`] is the only path that touches the
//! network. It never runs implicitly; callers warm ahead of time and later
//! resolutions pick the value up from the cache.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::cache::{DistanceCache, now_ms};
use crate::config::{EngineConfig, EngineOptions};
use crate::coords::CoordinateStore;
use crate::enrich::Enricher;
use crate::error::EngineError;
use crate::geo::geodesic_km;
use crate::heuristic::{estimate_km, local_haul_km};
use crate::store::KeyValueStore;
use crate::table::PrecomputedTable;

/// Longest distance ever served, in kilometers.
pub const MAX_PLAUSIBLE_KM: f64 = 3500.0;

/// Which layer produced a resolved distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    LocalHaul,
    Cache,
    Table,
    Geodesic,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub km: f64,
    pub source: Source,
}

pub struct DistanceEngine {
    coordinates: Arc<CoordinateStore>,
    table: Arc<PrecomputedTable>,
    cache: Arc<DistanceCache>,
    config: RwLock<EngineConfig>,
    enricher: RwLock<Arc<Enricher>>,
    custom_enricher: bool,
}

impl std::fmt::Debug for DistanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceEngine")
            .field("coordinates", &self.coordinates.len())
            .field("table", &self.table.len())
            .field("cache", &self.cache)
            .field("config", &*self.config.read().unwrap_or_else(|e| e.into_inner()))
            .finish_non_exhaustive()
    }
}

impl DistanceEngine {
    pub fn new(
        config: EngineConfig,
        coordinates: Arc<CoordinateStore>,
        table: Arc<PrecomputedTable>,
        cache: Arc<DistanceCache>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let enricher = Enricher::from_config(&config)?;

        Ok(Self {
            coordinates,
            table,
            cache,
            config: RwLock::new(config),
            enricher: RwLock::new(Arc::new(enricher)),
            custom_enricher: false,
        })
    }

    /// Engine over the compiled-in coordinates and table, with the cache
    /// loaded from `store`.
    pub fn with_builtin_assets(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, EngineError> {
        Self::new(
            config,
            Arc::new(CoordinateStore::builtin()?),
            Arc::new(PrecomputedTable::builtin()?),
            Arc::new(DistanceCache::load(store)),
        )
    }

    /// Replace the configured provider chain. Later calls to
    /// [`configure`](Self::configure) only toggle it on or off.
    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = RwLock::new(Arc::new(enricher));
        self.custom_enricher = true;
        self
    }

    pub fn cache(&self) -> &Arc<DistanceCache> {
        &self.cache
    }

    pub fn config(&self) -> EngineConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Distance in kilometers, or `None` if either name is empty or the
    /// resolved value is implausible.
    pub fn resolve_distance(&self, from: &str, to: &str) -> Option<f64> {
        self.resolve_detailed(from, to).map(|r| r.km)
    }

    pub fn resolve_detailed(&self, from: &str, to: &str) -> Option<Resolution> {
        self.resolve_at(from, to, now_ms())
    }

    /// Resolution against an explicit clock, in milliseconds since the epoch.
    pub fn resolve_at(&self, from: &str, to: &str, now_ms: i64) -> Option<Resolution> {
        if from.is_empty() || to.is_empty() {
            return None;
        }

        let resolution = self.lookup(from, to, now_ms);
        if (0.0..=MAX_PLAUSIBLE_KM).contains(&resolution.km) {
            Some(resolution)
        } else {
            debug!(from, to, km = resolution.km, source = ?resolution.source, "discarding implausible distance");
            None
        }
    }

    fn lookup(&self, from: &str, to: &str, now_ms: i64) -> Resolution {
        if from == to {
            return Resolution {
                km: local_haul_km(&mut rand::thread_rng()),
                source: Source::LocalHaul,
            };
        }

        let ttl = self.config.read().unwrap_or_else(|e| e.into_inner()).cache_ttl();
        if let Some(entry) = self.cache.get_fresh(from, to, ttl, now_ms) {
            return Resolution {
                km: entry.km,
                source: Source::Cache,
            };
        }

        if let Some(km) = self.table.lookup(from, to) {
            return Resolution {
                km,
                source: Source::Table,
            };
        }

        if let (Some(a), Some(b)) = (self.coordinates.get(from), self.coordinates.get(to)) {
            return Resolution {
                km: geodesic_km(a, b),
                source: Source::Geodesic,
            };
        }

        Resolution {
            km: estimate_km(from, to, &mut rand::thread_rng()),
            source: Source::Heuristic,
        }
    }

    /// Fetch an authoritative distance from the online providers and cache
    /// it for both directions. `None` on any failure or when disabled.
    pub async fn warm_distance(&self, from: &str, to: &str) -> Option<f64> {
        let enricher = Arc::clone(&*self.enricher.read().unwrap_or_else(|e| e.into_inner()));
        enricher
            .warm_distance(from, to, &self.coordinates, &self.cache)
            .await
    }

    /// Patch the live configuration. On error nothing changes.
    pub fn configure(&self, options: EngineOptions) -> Result<(), EngineError> {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut updated = config.clone();
        updated.apply(&options)?;

        let enricher = if self.custom_enricher {
            let current = self.enricher.read().unwrap_or_else(|e| e.into_inner());
            current.with_enabled(updated.enable_online)
        } else {
            Enricher::from_config(&updated)?
        };

        *self.enricher.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(enricher);
        *config = updated;
        debug!(config = ?*config, "engine reconfigured");
        Ok(())
    }

    /// Every location in the coordinate store or the precomputed table.
    pub fn list_known_locations(&self) -> Vec<String> {
        self.coordinates
            .names()
            .chain(self.table.locations())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn location_is_known(&self, name: &str) -> bool {
        self.coordinates.has_coordinates(name) || self.table.contains_location(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    const HOUR_MS: i64 = 3_600_000;

    fn engine() -> DistanceEngine {
        let mut coords = HashMap::new();
        coords.insert("Frankfurt".to_string(), Coordinate::new(50.1109, 8.6821));
        coords.insert("Munich".to_string(), Coordinate::new(48.1351, 11.5820));
        coords.insert("Paris".to_string(), Coordinate::new(48.8566, 2.3522));
        coords.insert("Berlin".to_string(), Coordinate::new(52.52, 13.405));
        coords.insert("Lisbon".to_string(), Coordinate::new(38.7223, -9.1393));
        coords.insert("Moscow".to_string(), Coordinate::new(55.7558, 37.6173));

        let table = PrecomputedTable::from_json(
            r#"{"Frankfurt": {"Munich": 392}, "Reykjavik": {"Anchorage": 5000}}"#,
        )
        .unwrap();

        DistanceEngine::new(
            EngineConfig::default(),
            Arc::new(CoordinateStore::new(coords)),
            Arc::new(table),
            Arc::new(DistanceCache::load(Arc::new(MemoryStore::new()))),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_names_resolve_to_none() {
        let engine = engine();
        assert_eq!(engine.resolve_distance("", "Munich"), None);
        assert_eq!(engine.resolve_distance("Munich", ""), None);
        assert_eq!(engine.resolve_distance("", ""), None);
    }

    #[test]
    fn test_identity_is_local_haul() {
        let engine = engine();
        for name in ["Frankfurt", "Nowhere", "x"] {
            let resolution = engine.resolve_detailed(name, name).unwrap();
            assert_eq!(resolution.source, Source::LocalHaul);
            assert!((5.0..32.0).contains(&resolution.km));
        }
    }

    #[test]
    fn test_table_both_directions() {
        let engine = engine();
        assert_eq!(engine.resolve_distance("Frankfurt", "Munich"), Some(392.0));
        assert_eq!(engine.resolve_distance("Munich", "Frankfurt"), Some(392.0));
        assert_eq!(engine.resolve_detailed("Munich", "Frankfurt").unwrap().source, Source::Table);
    }

    #[test]
    fn test_fresh_cache_beats_table() {
        let engine = engine();
        engine.cache().put("Munich", "Frankfurt", 401.5);

        let resolution = engine.resolve_detailed("Frankfurt", "Munich").unwrap();
        assert_eq!(resolution.km, 401.5);
        assert_eq!(resolution.source, Source::Cache);
    }

    #[test]
    fn test_expired_cache_falls_through() {
        let engine = engine();
        let now = 10_000 * HOUR_MS;
        engine.cache().put_at("Frankfurt", "Munich", 401.5, now - 400 * HOUR_MS);

        let resolution = engine.resolve_at("Frankfurt", "Munich", now).unwrap();
        assert_eq!(resolution.km, 392.0);
        assert_eq!(resolution.source, Source::Table);
    }

    #[test]
    fn test_ttl_follows_configuration() {
        let engine = engine();
        let now = 10_000 * HOUR_MS;
        engine.cache().put_at("Paris", "Berlin", 878.0, now - 2 * HOUR_MS);
        assert_eq!(engine.resolve_at("Paris", "Berlin", now).unwrap().source, Source::Cache);

        engine
            .configure(EngineOptions {
                cache_ttl_hours: Some(1.0),
                ..EngineOptions::default()
            })
            .unwrap();
        assert_eq!(engine.resolve_at("Paris", "Berlin", now).unwrap().source, Source::Geodesic);
    }

    #[test]
    fn test_geodesic_when_no_table_entry() {
        let engine = engine();
        let resolution = engine.resolve_detailed("Paris", "Berlin").unwrap();
        assert_eq!(resolution.source, Source::Geodesic);
        assert_eq!(resolution.km, 877.5);
    }

    #[test]
    fn test_heuristic_when_no_data() {
        let engine = engine();
        let resolution = engine.resolve_detailed("Atlantis", "El Dorado").unwrap();
        assert_eq!(resolution.source, Source::Heuristic);
        assert!(resolution.km > 0.0 && resolution.km <= MAX_PLAUSIBLE_KM);
    }

    #[test]
    fn test_cap_applies_to_every_layer() {
        let engine = engine();
        assert_eq!(engine.resolve_distance("Lisbon", "Moscow"), None);
        assert_eq!(engine.resolve_distance("Reykjavik", "Anchorage"), None);

        engine.cache().put("Paris", "Berlin", 3600.0);
        assert_eq!(engine.resolve_distance("Berlin", "Paris"), None);
    }

    #[test]
    fn test_configure_rejects_bad_ttl_and_keeps_old_config() {
        let engine = engine();
        let err = engine.configure(EngineOptions {
            enable_online: Some(true),
            cache_ttl_hours: Some(0.0),
            region_bias: None,
        });
        assert!(err.is_err());
        assert!(!engine.config().enable_online);
        assert_eq!(engine.config().cache_ttl_hours, 336.0);
    }

    #[test]
    fn test_known_locations() {
        let engine = engine();
        let names = engine.list_known_locations();

        assert_eq!(names.len(), 8);
        assert!(names.contains(&"Anchorage".to_string()));
        assert!(engine.location_is_known("Reykjavik"));
        assert!(engine.location_is_known("Paris"));
        assert!(!engine.location_is_known("paris"));
    }

    #[tokio::test]
    async fn test_warm_disabled_by_default() {
        let engine = engine();
        assert_eq!(engine.warm_distance("Paris", "Berlin").await, None);
        assert!(engine.cache().is_empty());
    }
}
