use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::services::geo::Coordinates;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Forward-geocoding client. Constructed once at startup and passed by
/// reference; one outbound call per `resolve`, no retries, no caching.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodePayload {
    status: String,
    results: Option<Vec<GeocodeHit>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    geometry: Option<GeocodeGeometry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: Option<GeocodeLatLng>,
}

#[derive(Debug, Deserialize)]
struct GeocodeLatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Base-URL override for tests and self-hosted provider proxies.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub async fn resolve(&self, address: &str) -> Result<Coordinates, ApiError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ApiError::validation("Address is required."));
        }
        if self.api_key.is_empty() {
            return Err(ApiError::configuration(
                "Geocoding is not configured. Set GOOGLE_MAPS_API_KEY.",
            ));
        }

        let resp = match self
            .http
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("📍 Geocode upstream unreachable: {}", e);
                return Err(ApiError::upstream("Unable to geocode address.", e));
            }
        };

        if !resp.status().is_success() {
            warn!("📍 Geocode upstream non-OK: {}", resp.status());
            return Err(ApiError::upstream(
                "Unable to geocode address.",
                resp.status(),
            ));
        }

        let payload: GeocodePayload = match resp.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!("📍 Geocode upstream JSON parse failed: {}", e);
                return Err(ApiError::upstream("Unable to geocode address.", e));
            }
        };

        coordinates_from_payload(payload)
    }
}

fn coordinates_from_payload(payload: GeocodePayload) -> Result<Coordinates, ApiError> {
    let hits = payload.results.unwrap_or_default();
    if payload.status != "OK" || hits.is_empty() {
        return Err(ApiError::not_found(
            "Unable to geocode the provided address.",
        ));
    }

    let location = hits
        .into_iter()
        .next()
        .and_then(|hit| hit.geometry)
        .and_then(|geometry| geometry.location);

    match location {
        Some(loc) => Ok(Coordinates::new(loc.lat, loc.lng)),
        None => Err(ApiError::not_found("No location returned from geocoding.")),
    }
}
