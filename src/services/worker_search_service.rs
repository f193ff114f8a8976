use std::cmp::Ordering;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::worker_repo::{self, CandidateFilter, CANDIDATE_CAP};
use crate::error::ApiError;
use crate::models::{VisibilityPolicy, WorkerSearchRow};
use crate::services::geo::{self, Coordinates, DistanceUnit};

pub const DEFAULT_LIMIT: usize = 12;
pub const MAX_LIMIT: usize = 50;
/// The strict tier always returns at most this many rows, independent of the
/// caller's limit.
pub const STRICT_RESULT_CAP: usize = 50;
pub const DEFAULT_RADIUS_KM: f64 = 25.0;
pub const DEFAULT_RADIUS_MILES: f64 = 25.0;
pub const MAX_RADIUS_MILES: f64 = 200.0;

/// UI sentinel meaning "no skill filter"; stripped at the parse boundary so
/// the engine only ever sees a real filter or none.
const ALL_SERVICES_SENTINEL: &str = "All Services";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    RatingDesc,
    PriceAsc,
    PriceDesc,
    ExperienceDesc,
}

impl SortKey {
    pub fn parse(input: Option<&str>) -> Self {
        match input.unwrap_or("rating_desc") {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "experience_desc" => Self::ExperienceDesc,
            _ => Self::RatingDesc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RatingDesc => "rating_desc",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::ExperienceDesc => "experience_desc",
        }
    }
}

/// How requested skills are matched against a worker's skill set. Substring
/// mirrors the strict endpoint's historical behavior and can over-match
/// ("AC Service" matches a search for "Service"); Exact is the browse
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillMatch {
    Exact,
    Substring,
}

/// The two deliberately different search tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTier {
    /// Optional skills, caller radius only, requested sort, caller limit.
    Browse,
    /// Skills and coordinates required, distance bounded by
    /// `min(caller radius, worker service radius)`, distance-ranked, fixed
    /// result cap.
    Strict,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub tier: SearchTier,
    pub skills: Option<Vec<String>>,
    pub q: Option<String>,
    pub max_rate: Option<f64>,
    pub coords: Option<Coordinates>,
    pub radius: f64,
    pub unit: DistanceUnit,
    pub sort: SortKey,
    pub limit: usize,
    pub random: bool,
    pub skill_match: SkillMatch,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            tier: SearchTier::Browse,
            skills: None,
            q: None,
            max_rate: None,
            coords: None,
            radius: DEFAULT_RADIUS_KM,
            unit: DistanceUnit::Km,
            sort: SortKey::RatingDesc,
            limit: DEFAULT_LIMIT,
            random: false,
            skill_match: SkillMatch::Exact,
        }
    }
}

/// Result projection sent over the wire. `distance` is in the unit the
/// request spoke and absent in no-location mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerView {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub skills: Vec<String>,
    pub experience_years: i64,
    pub rating: f64,
    pub total_reviews: i64,
    pub price_per_service: f64,
    pub pay_type: String,
    pub service_radius_km: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl WorkerView {
    fn from_row(row: WorkerSearchRow) -> Self {
        Self {
            id: row.worker_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            skills: row.skills,
            experience_years: row.experience_years,
            rating: row.rating,
            total_reviews: row.total_reviews,
            price_per_service: row.price_per_service,
            pay_type: row.pay_type,
            service_radius_km: row.service_radius_km,
            city: row.city,
            state: row.state,
            distance: row.distance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub count: usize,
    pub results: Vec<WorkerView>,
}

/// Splits a CSV query value into a skill filter, dropping blanks and the
/// "All Services" sentinel. `None` means "no filter".
pub fn parse_skill_list(raw: Option<&str>) -> Option<Vec<String>> {
    let list = raw?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty() && *item != ALL_SERVICES_SENTINEL)
        .map(str::to_string)
        .collect::<Vec<_>>();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

pub async fn search(
    pool: &SqlitePool,
    policy: VisibilityPolicy,
    query: &SearchQuery,
) -> Result<SearchPage, ApiError> {
    if query.tier == SearchTier::Strict {
        if query.skills.is_none() {
            return Err(ApiError::validation("service is required"));
        }
        if query.coords.is_none() {
            return Err(ApiError::validation("lat and lng are required"));
        }
    }

    match query.coords {
        Some(center) => search_near(pool, policy, query, center).await,
        None => search_without_location(pool, policy, query).await,
    }
}

async fn search_near(
    pool: &SqlitePool,
    policy: VisibilityPolicy,
    query: &SearchQuery,
    center: Coordinates,
) -> Result<SearchPage, ApiError> {
    if !center.latitude.is_finite() || !center.longitude.is_finite() {
        return Err(ApiError::validation("lat and lng must be numbers"));
    }
    if !geo::in_range(center.latitude, center.longitude) {
        return Err(ApiError::validation("lat or lng out of range"));
    }
    if !query.radius.is_finite() || query.radius <= 0.0 {
        return Err(ApiError::validation("radius must be a positive number"));
    }

    let radius_km = query.unit.to_km(query.radius);
    let bbox = geo::bounding_box(center.latitude, center.longitude, radius_km);

    let rows = worker_repo::list_candidates(
        pool,
        policy,
        &CandidateFilter {
            bbox: Some(bbox),
            require_coords: true,
            max_rate: query.max_rate,
        },
    )
    .await
    .map_err(|e| {
        warn!("worker candidate query failed: {}", e);
        ApiError::upstream("Failed to search workers.", e)
    })?;

    if rows.len() as i64 == CANDIDATE_CAP {
        warn!(
            "📍 candidate prefilter hit cap ({}) around {:.4},{:.4}; results may be truncated",
            CANDIDATE_CAP, center.latitude, center.longitude
        );
    }

    let mut hits = Vec::new();
    for mut row in rows {
        row.skills = parse_skills_json(&row.skills_json);

        if let Some(wanted) = query.skills.as_deref() {
            if !skills_match(&row.skills, wanted, query.skill_match) {
                continue;
            }
        }
        if !matches_text_filter(&row, query.q.as_deref()) {
            continue;
        }

        let (Some(lat), Some(lng)) = (row.latitude, row.longitude) else {
            continue;
        };
        let dist_km = geo::haversine_km(center.latitude, center.longitude, lat, lng);
        if dist_km > radius_km {
            continue;
        }
        if query.tier == SearchTier::Strict && dist_km > row.service_radius_km as f64 {
            continue;
        }

        row.distance = Some(query.unit.from_km(dist_km));
        hits.push(row);
    }

    match query.tier {
        SearchTier::Strict => {
            hits.sort_by(|a, b| {
                cmp_distance(a, b)
                    .then_with(|| cmp_sort_key(a, b, query.sort))
                    .then_with(|| a.worker_id.cmp(&b.worker_id))
            });
            hits.truncate(STRICT_RESULT_CAP);
        }
        SearchTier::Browse => {
            hits.sort_by(|a, b| {
                cmp_sort_key(a, b, query.sort).then_with(|| a.worker_id.cmp(&b.worker_id))
            });
            hits.truncate(query.limit.clamp(1, MAX_LIMIT));
        }
    }

    let results = hits.into_iter().map(WorkerView::from_row).collect::<Vec<_>>();
    Ok(SearchPage {
        count: results.len(),
        results,
    })
}

async fn search_without_location(
    pool: &SqlitePool,
    policy: VisibilityPolicy,
    query: &SearchQuery,
) -> Result<SearchPage, ApiError> {
    let limit = query.limit.clamp(1, MAX_LIMIT);

    // Explicitly-requested random sample: visibility-gated, otherwise
    // unfiltered.
    if query.random {
        let rows = worker_repo::sample_random(pool, policy, limit as i64)
            .await
            .map_err(|e| {
                warn!("worker random sample failed: {}", e);
                ApiError::upstream("Failed to fetch workers.", e)
            })?;
        let results = rows
            .into_iter()
            .map(|mut row| {
                row.skills = parse_skills_json(&row.skills_json);
                WorkerView::from_row(row)
            })
            .collect::<Vec<_>>();
        return Ok(SearchPage {
            count: results.len(),
            results,
        });
    }

    let rows = worker_repo::list_candidates(
        pool,
        policy,
        &CandidateFilter {
            bbox: None,
            require_coords: false,
            max_rate: query.max_rate,
        },
    )
    .await
    .map_err(|e| {
        warn!("worker browse query failed: {}", e);
        ApiError::upstream("Failed to fetch workers.", e)
    })?;

    let mut hits = Vec::new();
    for mut row in rows {
        row.skills = parse_skills_json(&row.skills_json);
        if let Some(wanted) = query.skills.as_deref() {
            if !skills_match(&row.skills, wanted, query.skill_match) {
                continue;
            }
        }
        if !matches_text_filter(&row, query.q.as_deref()) {
            continue;
        }
        hits.push(row);
    }

    hits.sort_by(|a, b| cmp_sort_key(a, b, query.sort).then_with(|| a.worker_id.cmp(&b.worker_id)));
    hits.truncate(limit);

    let results = hits.into_iter().map(WorkerView::from_row).collect::<Vec<_>>();
    Ok(SearchPage {
        count: results.len(),
        results,
    })
}

fn parse_skills_json(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn skills_match(worker_skills: &[String], wanted: &[String], policy: SkillMatch) -> bool {
    wanted.iter().any(|want| {
        worker_skills.iter().any(|have| match policy {
            SkillMatch::Exact => have.eq_ignore_ascii_case(want),
            SkillMatch::Substring => have.to_lowercase().contains(&want.to_lowercase()),
        })
    })
}

/// Free-text `q` filter: matches the worker name or any skill,
/// case-insensitive substring.
fn matches_text_filter(row: &WorkerSearchRow, q: Option<&str>) -> bool {
    let Some(needle) = q.map(str::trim).filter(|v| !v.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    row.name.to_lowercase().contains(&needle)
        || row
            .skills
            .iter()
            .any(|skill| skill.to_lowercase().contains(&needle))
}

fn cmp_distance(a: &WorkerSearchRow, b: &WorkerSearchRow) -> Ordering {
    a.distance
        .unwrap_or(f64::MAX)
        .partial_cmp(&b.distance.unwrap_or(f64::MAX))
        .unwrap_or(Ordering::Equal)
}

fn cmp_sort_key(a: &WorkerSearchRow, b: &WorkerSearchRow, sort: SortKey) -> Ordering {
    match sort {
        SortKey::RatingDesc => b
            .rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal),
        SortKey::PriceAsc => a
            .price_per_service
            .partial_cmp(&b.price_per_service)
            .unwrap_or(Ordering::Equal),
        SortKey::PriceDesc => b
            .price_per_service
            .partial_cmp(&a.price_per_service)
            .unwrap_or(Ordering::Equal),
        SortKey::ExperienceDesc => b.experience_years.cmp(&a.experience_years),
    }
}
