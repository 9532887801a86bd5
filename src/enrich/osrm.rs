//! OSRM HTTP adapter for single-pair driving distances.
//!
//! Talks to a self-hosted routing engine, so it needs coordinates for both
//! endpoints but no credential.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DistanceProvider, Place, REQUEST_TIMEOUT};
use crate::error::EnrichmentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Like [`new`](Self::new) with a custom per-request timeout.
    pub fn with_timeout(config: OsrmConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { config, client })
    }

    fn table_url(&self, from: &Place<'_>, to: &Place<'_>) -> Result<String, EnrichmentError> {
        let coords = [from, to]
            .iter()
            .map(|place| {
                place
                    .coordinate
                    .map(|c| format!("{:.6},{:.6}", c.lon, c.lat))
                    .ok_or_else(|| EnrichmentError::MissingCoordinates(place.name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?
            .join(";");

        Ok(format!(
            "{}/table/v1/{}/{}?annotations=distance&sources=0&destinations=1",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        ))
    }
}

#[async_trait]
impl DistanceProvider for OsrmClient {
    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn distance_meters(&self, from: &Place<'_>, to: &Place<'_>) -> Result<f64, EnrichmentError> {
        let url = self.table_url(from, to)?;
        debug!(%url, "requesting OSRM table");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::HttpStatus(status.as_u16()));
        }

        let text = response.text().await?;
        parse_table_meters(&text)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

pub(crate) fn parse_table_meters(body: &str) -> Result<f64, EnrichmentError> {
    let table: OsrmTableResponse = serde_json::from_str(body)?;
    if table.code != "Ok" {
        return Err(EnrichmentError::ProviderStatus(table.code));
    }

    table
        .distances
        .unwrap_or_default()
        .first()
        .and_then(|row| row.first().copied().flatten())
        .ok_or(EnrichmentError::MissingDistance)
}
