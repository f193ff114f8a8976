use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
}

pub async fn geocode_handler(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Value>, ApiError> {
    let address = query
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::validation("Address is required."))?;

    let coords = state.geocoder.resolve(address).await?;

    Ok(Json(json!({
        "success": true,
        "latitude": coords.latitude,
        "longitude": coords.longitude,
    })))
}
