pub mod routes;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::models::VisibilityPolicy;
use crate::services::geocode_service::GeocodeClient;
use crate::services::geoip_service::GeoIpClient;
use crate::services::location_service::LocationResolver;

/// Shared request state: the pool plus provider clients constructed once at
/// startup. The visibility policy is fixed here so no handler can pick its
/// own.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub geocoder: GeocodeClient,
    pub geoip: GeoIpClient,
    pub visibility_policy: VisibilityPolicy,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        Self {
            pool,
            geocoder: GeocodeClient::new(config.google_maps_api_key.clone()),
            geoip: GeoIpClient::new(config.geoip_base_url.clone()),
            visibility_policy: config.visibility_policy,
        }
    }

    /// A fresh resolver per request: supersession tokens order attempts
    /// within one client's session, not across unrelated requests.
    pub fn location_resolver(&self) -> LocationResolver {
        LocationResolver::new(self.geocoder.clone(), self.geoip.clone())
    }
}
