use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;
use crate::services::geo::Coordinates;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// IP-based geolocation against an ipapi.co-shaped provider. Last resort of
/// the location fallback chain; the payload is loosely typed because the
/// provider sometimes returns numbers as strings.
#[derive(Debug, Clone)]
pub struct GeoIpClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone)]
pub struct GeoIpLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl GeoIpLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// "city, region, country" with empty parts skipped; defaults to
    /// "Current location" when nothing is known.
    pub fn label(&self) -> String {
        let joined = [&self.city, &self.region, &self.country]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if joined.is_empty() {
            "Current location".to_string()
        } else {
            joined
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoIpPayload {
    latitude: Option<Value>,
    longitude: Option<Value>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl GeoIpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn lookup(&self, ip: Option<&str>) -> Result<GeoIpLocation, ApiError> {
        let base = self.base_url.trim_end_matches('/');
        let url = match ip.map(str::trim).filter(|v| !v.is_empty()) {
            Some(ip) => format!("{}/{}/json/", base, ip),
            None => format!("{}/json/", base),
        };

        let resp = match self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("📍 Geo IP upstream unreachable: {}", e);
                return Err(ApiError::upstream("Geo IP lookup failed.", e));
            }
        };

        if !resp.status().is_success() {
            warn!("📍 Geo IP upstream non-OK: {}", resp.status());
            return Err(ApiError::upstream("Geo IP lookup failed.", resp.status()));
        }

        let payload: GeoIpPayload = match resp.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!("📍 Geo IP JSON parse failed: {}", e);
                return Err(ApiError::upstream("Geo IP lookup failed.", e));
            }
        };

        location_from_payload(payload)
    }
}

fn location_from_payload(payload: GeoIpPayload) -> Result<GeoIpLocation, ApiError> {
    let latitude = payload.latitude.as_ref().and_then(coerce_f64);
    let longitude = payload.longitude.as_ref().and_then(coerce_f64);

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
            Ok(GeoIpLocation {
                latitude,
                longitude,
                city: payload.city.unwrap_or_default(),
                region: payload.region.unwrap_or_default(),
                country: payload.country_name.or(payload.country).unwrap_or_default(),
            })
        }
        _ => Err(ApiError::not_found("Geo IP location unavailable.")),
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
