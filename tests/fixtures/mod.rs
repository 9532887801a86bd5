//! Test fixtures for haul-distance.
//!
//! Provides:
//! - Real city coordinates and road distances
//! - Engine builders over in-memory storage
//! - A scripted distance provider
//! - A one-shot local HTTP responder

#![allow(dead_code)]

pub mod european_cities;
pub mod http;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use haul_distance::error::EnrichmentError;
use haul_distance::{
    DistanceCache, DistanceEngine, DistanceProvider, EngineConfig, Enricher, KeyValueStore,
    MemoryStore, Place,
};

pub use european_cities::*;

/// Engine over the fixture cities with an in-memory cache.
pub fn engine(config: EngineConfig) -> DistanceEngine {
    engine_with_store(config, Arc::new(MemoryStore::new()))
}

pub fn engine_with_store(config: EngineConfig, store: Arc<dyn KeyValueStore>) -> DistanceEngine {
    DistanceEngine::new(
        config,
        Arc::new(coordinate_store()),
        Arc::new(distance_table()),
        Arc::new(DistanceCache::load(store)),
    )
    .expect("build engine")
}

/// Engine with online enrichment on and `provider` as the only source.
pub fn online_engine(provider: Arc<ScriptedProvider>) -> DistanceEngine {
    let config = EngineConfig {
        enable_online: true,
        ..EngineConfig::default()
    };
    let provider: Arc<dyn DistanceProvider> = provider;
    engine(config).with_enricher(Enricher::new(true, vec![provider]))
}

/// Replies from a queue of canned results and records the pairs it was asked for.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<f64, EnrichmentError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<f64, EnrichmentError>>) -> Arc<Self> {
        let mut replies = replies;
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn meters(values: &[f64]) -> Arc<Self> {
        Self::new(values.iter().map(|m| Ok(*m)).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DistanceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn distance_meters(&self, from: &Place<'_>, to: &Place<'_>) -> Result<f64, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((from.name.to_string(), to.name.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(EnrichmentError::MissingDistance))
    }
}
