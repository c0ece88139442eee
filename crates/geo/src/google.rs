//! Google Distance Matrix client.

use async_trait::async_trait;
use autoparc_core::{round_km, Coordinates, RouteEstimate};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::provider::{DistanceProvider, GeoError};

/// Public Google Maps API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Distance Matrix API client.
///
/// Makes a single attempt per lookup with the HTTP client's default timeout
/// behaviour.
#[derive(Clone)]
pub struct GoogleDistanceMatrix {
    /// HTTP client
    client: Client,

    /// API root, without trailing slash
    base_url: String,

    /// API key
    api_key: Option<String>,
}

impl GoogleDistanceMatrix {
    /// Create a client for the public endpoint.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
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
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

fn parse_matrix(body: MatrixResponse) -> Result<RouteEstimate, GeoError> {
    if body.status != "OK" {
        return Err(GeoError::Status(body.status));
    }
    let element = body
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| GeoError::Malformed("no matrix element".to_string()))?;
    if element.status != "OK" {
        return Err(GeoError::Status(element.status));
    }
    let metres = element
        .distance
        .ok_or_else(|| GeoError::Malformed("missing distance".to_string()))?
        .value;
    let seconds = element
        .duration
        .ok_or_else(|| GeoError::Malformed("missing duration".to_string()))?
        .value;

    Ok(RouteEstimate {
        distance_km: round_km(metres / 1000.0),
        duration_min: Some((seconds / 60.0).round() as u32),
    })
}

#[async_trait]
impl DistanceProvider for GoogleDistanceMatrix {
    fn name(&self) -> &str {
        "google-distance-matrix"
    }

    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, GeoError> {
        let key = self.api_key.as_deref().ok_or(GeoError::MissingApiKey)?;

        debug!("Distance Matrix lookup {} -> {}", origin, destination);

        let response = self
            .client
            .get(format!("{}/maps/api/distancematrix/json", self.base_url))
            .query(&[
                ("origins", origin.to_string().as_str()),
                ("destinations", destination.to_string().as_str()),
                ("key", key),
                ("units", "metric"),
                ("language", "fr"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeoError::Status(response.status().to_string()));
        }

        let body: MatrixResponse = response.json().await?;
        parse_matrix(body)
    }
}
