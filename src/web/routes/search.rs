use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::geo::{Coordinates, DistanceUnit};
use crate::services::worker_search_service::{
    self, SearchQuery, SearchTier, SkillMatch, SortKey, DEFAULT_RADIUS_KM, STRICT_RESULT_CAP,
};
use crate::web::AppState;

/// Strict tier: services and coordinates required, radius in kilometres,
/// results distance-ranked and bounded by the worker's own service radius
/// as well.
#[derive(Debug, Deserialize, Default)]
pub struct SearchWorkersQuery {
    pub service: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub sort: Option<String>,
}

pub async fn search_workers_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchWorkersQuery>,
) -> Result<Json<Value>, ApiError> {
    let skills = worker_search_service::parse_skill_list(query.service.as_deref());
    let coords = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        _ => None,
    };

    let page = worker_search_service::search(
        &state.pool,
        state.visibility_policy,
        &SearchQuery {
            tier: SearchTier::Strict,
            skills,
            q: None,
            max_rate: None,
            coords,
            radius: query.radius.unwrap_or(DEFAULT_RADIUS_KM),
            unit: DistanceUnit::Km,
            sort: SortKey::parse(query.sort.as_deref()),
            limit: STRICT_RESULT_CAP,
            random: false,
            skill_match: SkillMatch::Substring,
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": page.count,
        "data": page.results,
    })))
}
