use crate::domain::model::GeocodeResult;
use crate::domain::ports::Geocoder;
use crate::utils::error::{GeoError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<Candidate>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Client for Google-style geocoding JSON APIs (`?address=...&key=...`).
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str, api_key: &str) -> Result<GeocodeResult> {
        tracing::debug!("Geocoding '{}' via {}", address, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::GeocodeFailed {
                address: address.to_string(),
                reason: format!("provider returned HTTP {}", status),
            });
        }

        let body: GeocodeResponse = response.json().await?;

        if body.status != STATUS_OK {
            if let Some(message) = &body.error_message {
                tracing::warn!("Provider status {} for '{}': {}", body.status, address, message);
            } else {
                tracing::debug!("Provider status {} for '{}'", body.status, address);
            }
            return Ok(GeocodeResult::NotFound);
        }

        Ok(match body.results.first() {
            Some(candidate) => GeocodeResult::Located {
                latitude: candidate.geometry.location.lat,
                longitude: candidate.geometry.location.lng,
            },
            None => GeocodeResult::NotFound,
        })
    }
}
