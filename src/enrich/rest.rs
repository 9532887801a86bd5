//! Distance-matrix REST adapter.
//!
//! Resolves by place name against a hosted distance-matrix endpoint using a
//! runtime-supplied API key. The key goes in the query string, so request
//! URLs are never logged and transport errors drop their URL.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{DistanceProvider, Place, REQUEST_TIMEOUT};
use crate::error::EnrichmentError;

pub const DEFAULT_DISTANCE_MATRIX_URL: &str =
    "https://maps.googleapis.com/maps/api/distancematrix/json";

#[derive(Clone)]
pub struct DistanceMatrixClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    region: Option<String>,
}

impl DistanceMatrixClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        region: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, api_key, region, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        region: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            region,
        })
    }

    fn query<'a>(&'a self, from: &'a Place<'_>, to: &'a Place<'_>) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![
            ("origins", from.name),
            ("destinations", to.name),
            ("mode", "driving"),
            ("units", "metric"),
            ("key", self.api_key.as_str()),
        ];
        if let Some(region) = &self.region {
            query.push(("region", region.as_str()));
        }
        query
    }
}

impl fmt::Debug for DistanceMatrixClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistanceMatrixClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

#[async_trait]
impl DistanceProvider for DistanceMatrixClient {
    fn name(&self) -> &'static str {
        "distance-matrix"
    }

    async fn distance_meters(&self, from: &Place<'_>, to: &Place<'_>) -> Result<f64, EnrichmentError> {
        debug!(from = from.name, to = to.name, region = ?self.region, "requesting distance matrix");

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(from, to))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::HttpStatus(status.as_u16()));
        }

        let text = response.text().await?;
        parse_matrix_meters(&text)
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

/// Extract the meters value of the single origin/destination element.
pub(crate) fn parse_matrix_meters(body: &str) -> Result<f64, EnrichmentError> {
    let matrix: MatrixResponse = serde_json::from_str(body)?;
    if matrix.status != "OK" {
        let detail = match matrix.error_message {
            Some(message) => format!("{}: {}", matrix.status, message),
            None => matrix.status,
        };
        return Err(EnrichmentError::ProviderStatus(detail));
    }

    let element = matrix
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or(EnrichmentError::MissingDistance)?;

    if element.status != "OK" {
        return Err(EnrichmentError::ProviderStatus(element.status));
    }

    element
        .distance
        .map(|d| d.value)
        .ok_or(EnrichmentError::MissingDistance)
}
