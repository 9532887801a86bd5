//! Engine configuration.
//!
//! Built once and handed to [`crate::engine::DistanceEngine::new`]; the
//! caller-facing subset can be patched at runtime through [`EngineOptions`].
//! The provider credential only ever comes from the environment or a config
//! file, never from source.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enrich::osrm::OsrmConfig;
use crate::enrich::rest::DEFAULT_DISTANCE_MATRIX_URL;
use crate::error::ConfigError;

pub const DEFAULT_CACHE_TTL_HOURS: f64 = 336.0;

pub const ENV_API_KEY: &str = "HAUL_DISTANCE_API_KEY";
pub const ENV_ENABLE_ONLINE: &str = "HAUL_DISTANCE_ENABLE_ONLINE";
pub const ENV_CACHE_TTL_HOURS: &str = "HAUL_DISTANCE_CACHE_TTL_HOURS";
pub const ENV_REGION: &str = "HAUL_DISTANCE_REGION";
pub const ENV_OSRM_URL: &str = "HAUL_DISTANCE_OSRM_URL";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Online enrichment is off unless explicitly enabled.
    pub enable_online: bool,
    /// Maximum age of a cache entry, in hours.
    pub cache_ttl_hours: f64,
    /// Region hint passed to the distance-matrix provider (e.g. "de").
    pub region_bias: Option<String>,
    /// Distance-matrix API credential. Without it the REST adapter is not built.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub rest_base_url: String,
    /// Self-hosted routing engine, preferred over the REST adapter when set.
    pub osrm: Option<OsrmConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_online: false,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            region_bias: None,
            api_key: None,
            rest_base_url: DEFAULT_DISTANCE_MATRIX_URL.to_string(),
            osrm: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("enable_online", &self.enable_online)
            .field("cache_ttl_hours", &self.cache_ttl_hours)
            .field("region_bias", &self.region_bias)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("rest_base_url", &self.rest_base_url)
            .field("osrm", &self.osrm)
            .finish()
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from defaults overlaid with whatever `lookup` returns for the
    /// `HAUL_DISTANCE_*` variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key);
        }
        if let Some(raw) = lookup(ENV_ENABLE_ONLINE) {
            config.enable_online = parse_bool(ENV_ENABLE_ONLINE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_HOURS) {
            config.cache_ttl_hours = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CACHE_TTL_HOURS,
                value: raw.clone(),
            })?;
        }
        if let Some(region) = lookup(ENV_REGION).filter(|r| !r.trim().is_empty()) {
            config.region_bias = Some(region);
        }
        if let Some(base_url) = lookup(ENV_OSRM_URL).filter(|u| !u.trim().is_empty()) {
            config.osrm = Some(OsrmConfig {
                base_url,
                ..OsrmConfig::default()
            });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ttl(self.cache_ttl_hours)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs_f64(self.cache_ttl_hours * 3600.0)
    }

    /// Apply a partial update. Nothing changes if any supplied value is invalid.
    pub fn apply(&mut self, options: &EngineOptions) -> Result<(), ConfigError> {
        if let Some(hours) = options.cache_ttl_hours {
            validate_ttl(hours)?;
        }

        if let Some(enable) = options.enable_online {
            self.enable_online = enable;
        }
        if let Some(hours) = options.cache_ttl_hours {
            self.cache_ttl_hours = hours;
        }
        if let Some(region) = &options.region_bias {
            self.region_bias = Some(region.clone()).filter(|r| !r.is_empty());
        }
        Ok(())
    }
}

/// Runtime-adjustable subset of [`EngineConfig`]. `None` leaves a field as is;
/// an empty `region_bias` clears the bias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOptions {
    pub enable_online: Option<bool>,
    pub cache_ttl_hours: Option<f64>,
    pub region_bias: Option<String>,
}

fn validate_ttl(hours: f64) -> Result<(), ConfigError> {
    // Upper bound keeps Duration::from_secs_f64 from panicking.
    if hours.is_finite() && hours > 0.0 && hours < 1e12 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTtl(hours))
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
