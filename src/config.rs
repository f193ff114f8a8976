use std::env;

use crate::error::ApiError;
use crate::models::VisibilityPolicy;

/// Runtime configuration, read once at startup so a missing credential fails
/// the process instead of a request deep in a search path.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub google_maps_api_key: String,
    pub geoip_base_url: String,
    pub visibility_policy: VisibilityPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ApiError::configuration("DATABASE_URL must be set"))?;

        let google_maps_api_key = env::var("GOOGLE_MAPS_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::configuration("Geocoding is not configured. Set GOOGLE_MAPS_API_KEY.")
            })?;

        let geoip_base_url = env::var("GEOIP_BASE_URL")
            .unwrap_or_else(|_| "https://ipapi.co".to_string())
            .trim_end_matches('/')
            .to_string();

        let visibility_policy = match env::var("VISIBILITY_POLICY") {
            Ok(raw) => VisibilityPolicy::parse(&raw).ok_or_else(|| {
                ApiError::configuration(format!(
                    "VISIBILITY_POLICY must be status_only or status_and_subscription, got '{}'",
                    raw
                ))
            })?,
            Err(_) => VisibilityPolicy::StatusOnly,
        };

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            database_url,
            host,
            port,
            google_maps_api_key,
            geoip_base_url,
            visibility_policy,
        })
    }
}
