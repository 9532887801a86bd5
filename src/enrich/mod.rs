//! Optional online enrichment of the distance cache.
//!
//! Providers are tried in order; the first one that returns a distance wins
//! and its value is written to the cache for both directions. Every failure
//! is logged and turned into `None` with no cache write.

pub mod osrm;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::DistanceCache;
use crate::config::EngineConfig;
use crate::coords::CoordinateStore;
use crate::error::{EngineError, EnrichmentError};
use crate::geo::{Coordinate, round_km};
use crate::heuristic::local_haul_km;

pub use osrm::{OsrmClient, OsrmConfig};
pub use rest::DistanceMatrixClient;

/// Upper bound on any single provider request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// A location as handed to a provider: its name and, if known, coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place<'a> {
    pub name: &'a str,
    pub coordinate: Option<Coordinate>,
}

impl<'a> Place<'a> {
    pub fn new(name: &'a str, coordinate: Option<Coordinate>) -> Self {
        Self { name, coordinate }
    }
}

/// A source of authoritative travel distances.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Driving distance in meters between two places.
    async fn distance_meters(&self, from: &Place<'_>, to: &Place<'_>) -> Result<f64, EnrichmentError>;
}

pub struct Enricher {
    enabled: bool,
    providers: Vec<Arc<dyn DistanceProvider>>,
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("Enricher")
            .field("enabled", &self.enabled)
            .field("providers", &names)
            .finish()
    }
}

impl Enricher {
    pub fn new(enabled: bool, providers: Vec<Arc<dyn DistanceProvider>>) -> Self {
        Self { enabled, providers }
    }

    pub fn disabled() -> Self {
        Self::new(false, Vec::new())
    }

    /// Build the provider chain from configuration: the self-hosted routing
    /// engine first when configured, then the REST adapter when a credential
    /// is present.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut providers: Vec<Arc<dyn DistanceProvider>> = Vec::new();

        if let Some(osrm) = &config.osrm {
            let client = OsrmClient::new(osrm.clone()).map_err(EngineError::HttpClient)?;
            providers.push(Arc::new(client));
        }

        if let Some(api_key) = &config.api_key {
            let client = DistanceMatrixClient::new(
                config.rest_base_url.clone(),
                api_key.clone(),
                config.region_bias.clone(),
            )
            .map_err(EngineError::HttpClient)?;
            providers.push(Arc::new(client));
        }

        Ok(Self::new(config.enable_online, providers))
    }

    /// Same provider chain, switched on or off.
    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self::new(enabled, self.providers.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve an authoritative distance and write it to `cache`.
    ///
    /// Returns `None` when disabled, when either name is empty, when no
    /// provider is configured, or when every provider fails.
    pub async fn warm_distance(
        &self,
        from: &str,
        to: &str,
        coordinates: &CoordinateStore,
        cache: &DistanceCache,
    ) -> Option<f64> {
        if !self.enabled || from.is_empty() || to.is_empty() {
            return None;
        }

        if from == to {
            let km = local_haul_km(&mut rand::thread_rng());
            store_warmed(cache, from, to, km).await;
            return Some(km);
        }

        if self.providers.is_empty() {
            debug!(from, to, "no enrichment provider configured");
            return None;
        }

        let origin = Place::new(from, coordinates.get(from));
        let destination = Place::new(to, coordinates.get(to));

        for provider in &self.providers {
            match provider.distance_meters(&origin, &destination).await {
                Ok(meters) if meters.is_finite() && meters >= 0.0 => {
                    let km = round_km(meters / 1000.0);
                    debug!(provider = provider.name(), from, to, km, "enriched distance");
                    store_warmed(cache, from, to, km).await;
                    return Some(km);
                }
                Ok(meters) => {
                    warn!(provider = provider.name(), from, to, meters, "provider returned invalid distance");
                }
                Err(err) => {
                    warn!(provider = provider.name(), from, to, error = %err, "enrichment failed");
                }
            }
        }

        None
    }
}

// Memory is updated inline; the store write runs on the blocking pool.
async fn store_warmed(cache: &DistanceCache, from: &str, to: &str, km: f64) {
    if let Some(snapshot) = cache.record(from, to, km) {
        snapshot.persist_blocking().await;
    }
}
