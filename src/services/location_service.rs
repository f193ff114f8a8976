use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::error::ApiError;
use crate::services::geo::{self, Coordinates};
use crate::services::geocode_service::GeocodeClient;
use crate::services::geoip_service::GeoIpClient;

/// What the caller's environment reported about device geolocation. The
/// device fix itself is produced client-side; the pipeline only orders the
/// fallbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DevicePosition {
    Available(Coordinates),
    Denied,
    Unsupported,
}

#[derive(Debug, Clone, Default)]
pub struct LocationRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub text: Option<String>,
    pub device: Option<DevicePosition>,
    pub client_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved { coords: Coordinates, label: String },
    /// Search proceeds without distance filtering; `hint` is the user-facing
    /// nudge from whichever fallback failed last.
    NoLocation { hint: Option<String> },
    /// A newer resolution started while this one was in flight; the caller
    /// must discard this outcome.
    Superseded,
}

pub const HINT_ENABLE_PERMISSIONS: &str =
    "Unable to access your location. Please enable location permissions.";
pub const HINT_REFINE_ADDRESS: &str = "Unable to resolve address. Try a more specific location.";

/// Orders the fallback chain: explicit coords, device fix, IP lookup, text
/// geocoding. Every step failure is non-fatal and advances the chain.
/// Last-request-wins is enforced by request tokens, not completion order.
#[derive(Debug)]
pub struct LocationResolver {
    geocoder: GeocodeClient,
    geoip: GeoIpClient,
    generation: AtomicU64,
}

impl LocationResolver {
    pub fn new(geocoder: GeocodeClient, geoip: GeoIpClient) -> Self {
        Self {
            geocoder,
            geoip,
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a resolution attempt; any token handed out earlier is stale
    /// from this point on.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn finish(&self, token: u64, resolution: Resolution) -> Resolution {
        if self.generation.load(Ordering::SeqCst) != token {
            return Resolution::Superseded;
        }
        resolution
    }

    pub async fn resolve(
        &self,
        token: u64,
        request: &LocationRequest,
    ) -> Result<Resolution, ApiError> {
        // 1. Explicit coordinates win outright, but must be sane.
        if let (Some(lat), Some(lng)) = (request.lat, request.lng) {
            if !lat.is_finite() || !lng.is_finite() {
                return Err(ApiError::validation("lat and lng must be numbers"));
            }
            if !geo::in_range(lat, lng) {
                return Err(ApiError::validation("lat or lng out of range"));
            }
            let label = request
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:.4}, {:.4}", lat, lng));
            return Ok(self.finish(
                token,
                Resolution::Resolved {
                    coords: Coordinates::new(lat, lng),
                    label,
                },
            ));
        }

        let mut hint = None;

        // 2./3. Device fix, falling back to IP when denied or unsupported.
        match request.device {
            Some(DevicePosition::Available(coords)) => {
                return Ok(self.finish(
                    token,
                    Resolution::Resolved {
                        coords,
                        label: "Current location".to_string(),
                    },
                ));
            }
            Some(DevicePosition::Denied) | Some(DevicePosition::Unsupported) => {
                match self.geoip.lookup(request.client_ip.as_deref()).await {
                    Ok(location) => {
                        return Ok(self.finish(
                            token,
                            Resolution::Resolved {
                                coords: location.coordinates(),
                                label: location.label(),
                            },
                        ));
                    }
                    Err(e) => {
                        warn!("📍 Geo IP fallback failed: {}", e);
                        hint = Some(HINT_ENABLE_PERMISSIONS.to_string());
                    }
                }
            }
            None => {}
        }

        // 4. Free text, geocoded.
        if let Some(text) = request
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            match self.geocoder.resolve(text).await {
                Ok(coords) => {
                    return Ok(self.finish(
                        token,
                        Resolution::Resolved {
                            coords,
                            label: text.to_string(),
                        },
                    ));
                }
                Err(e) => {
                    warn!("📍 Geocode fallback failed: {}", e);
                    hint = Some(HINT_REFINE_ADDRESS.to_string());
                }
            }
        }

        // 5. Nothing resolved; search runs in no-location mode.
        Ok(self.finish(token, Resolution::NoLocation { hint }))
    }
}
