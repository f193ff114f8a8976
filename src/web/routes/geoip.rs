use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::web::AppState;

pub async fn geoip_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    // First hop of x-forwarded-for is the client.
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let location = state.geoip.lookup(ip.as_deref()).await?;

    Ok(Json(json!({
        "success": true,
        "latitude": location.latitude,
        "longitude": location.longitude,
        "city": location.city,
        "region": location.region,
        "country": location.country,
    })))
}
