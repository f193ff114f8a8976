use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::geo::DistanceUnit;
use crate::services::location_service::{LocationRequest, Resolution};
use crate::services::worker_search_service::{
    self, SearchQuery, SearchTier, SkillMatch, SortKey, DEFAULT_LIMIT, DEFAULT_RADIUS_MILES,
    MAX_LIMIT, MAX_RADIUS_MILES,
};
use crate::web::AppState;

/// Browse tier: every filter optional, distances in miles.
#[derive(Debug, Deserialize, Default)]
pub struct WorkersQuery {
    pub q: Option<String>,
    pub skill: Option<String>,
    #[serde(rename = "maxRate")]
    pub max_rate: Option<f64>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub random: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance: Option<f64>,
    pub location: Option<String>,
}

pub async fn list_workers_handler(
    State(state): State<AppState>,
    Query(query): Query<WorkersQuery>,
) -> Result<Json<Value>, ApiError> {
    let skills = worker_search_service::parse_skill_list(query.skill.as_deref());
    let sort = SortKey::parse(query.sort.as_deref());
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let random = query.random.as_deref() == Some("1");
    let distance_miles = query
        .distance
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(DEFAULT_RADIUS_MILES)
        .min(MAX_RADIUS_MILES);

    let has_location_input = query.lat.is_some()
        || query.lng.is_some()
        || query
            .location
            .as_deref()
            .map(str::trim)
            .is_some_and(|t| !t.is_empty());

    let coords = if has_location_input {
        let resolver = state.location_resolver();
        let token = resolver.begin();
        let request = LocationRequest {
            lat: query.lat,
            lng: query.lng,
            text: query.location.clone(),
            device: None,
            client_ip: None,
        };
        match resolver.resolve(token, &request).await {
            Ok(Resolution::Resolved { coords, .. }) => Some(coords),
            // Unresolvable text degrades to no-location mode.
            Ok(_) => None,
            Err(err @ ApiError::Validation(_)) => return Err(err),
            Err(_) => None,
        }
    } else {
        None
    };

    let page = worker_search_service::search(
        &state.pool,
        state.visibility_policy,
        &SearchQuery {
            tier: SearchTier::Browse,
            skills,
            q: query.q.clone(),
            max_rate: query.max_rate,
            coords,
            radius: distance_miles,
            unit: DistanceUnit::Miles,
            sort,
            limit,
            random,
            skill_match: SkillMatch::Exact,
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": page.count,
        "data": page.results,
    })))
}
