//! Error types for the distance engine.
//!
//! None of these cross the resolution path: lookups answer `None` when no
//! distance is available. They surface from construction, configuration and
//! the internals of the cache and enrichment layers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration values. These are programmer errors and are the only
/// errors returned by [`crate::engine::DistanceEngine::configure`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cache TTL must be a positive, finite number of hours (got {0})")]
    InvalidTtl(f64),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures of the durable key-value surface.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of a single enrichment attempt. Logged and mapped to `None` by
/// [`crate::enrich::Enricher::warm_distance`].
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("no coordinates for {0:?}")]
    MissingCoordinates(String),

    /// The URL is stripped on conversion; request URLs may carry a credential.
    #[error("provider request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider returned HTTP {0}")]
    HttpStatus(u16),

    #[error("provider status {0}")]
    ProviderStatus(String),

    #[error("provider response had no distance")]
    MissingDistance,

    #[error("provider response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        EnrichmentError::Transport(err.without_url())
    }
}

/// Failures while building a [`crate::engine::DistanceEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to read asset {path}: {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse asset: {0}")]
    AssetParse(#[from] serde_json::Error),
}
