use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::catalog_service::{self, UpsertServiceType};
use crate::web::AppState;

pub async fn list_services_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let services = catalog_service::list_active(&state.pool).await?;
    Ok(Json(json!({ "success": true, "data": services })))
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateServiceBody {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<i64>,
}

pub async fn create_service_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateServiceBody>,
) -> Result<Json<Value>, ApiError> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("name is required"))?;

    let service = catalog_service::upsert(
        &state.pool,
        UpsertServiceType {
            name: name.to_string(),
            slug: body.slug,
            is_active: body.is_active.unwrap_or(true),
            sort_order: body.sort_order.unwrap_or(0),
        },
    )
    .await?;

    Ok(Json(json!({ "success": true, "data": service })))
}
