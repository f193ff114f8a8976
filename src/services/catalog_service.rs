use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::database::service_type_repo;
use crate::error::ApiError;

/// Catalog projection used to populate the skill vocabulary. Not part of
/// ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceTypeView {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeDetailView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub sort_order: i64,
}

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<ServiceTypeView>, ApiError> {
    let rows = service_type_repo::list_active(pool).await.map_err(|e| {
        warn!("service type query failed: {}", e);
        ApiError::upstream("Failed to fetch services.", e)
    })?;

    Ok(rows
        .into_iter()
        .map(|row| ServiceTypeView {
            id: row.service_type_id,
            name: row.name,
            slug: row.slug,
        })
        .collect())
}

pub struct UpsertServiceType {
    pub name: String,
    pub slug: Option<String>,
    pub is_active: bool,
    pub sort_order: i64,
}

pub async fn upsert(
    pool: &SqlitePool,
    input: UpsertServiceType,
) -> Result<ServiceTypeDetailView, ApiError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }

    let slug = input
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| slugify(name));

    let id = Uuid::new_v4().to_string();
    let row = service_type_repo::upsert(pool, &id, name, &slug, input.is_active, input.sort_order)
        .await
        .map_err(|e| {
            warn!("service type upsert failed: {}", e);
            ApiError::upstream("Failed to create service.", e)
        })?;

    Ok(ServiceTypeDetailView {
        id: row.service_type_id,
        name: row.name,
        slug: row.slug,
        is_active: row.is_active == 1,
        sort_order: row.sort_order,
    })
}

/// "AC Service & Repair" -> "ac-service-and-repair".
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_lowercase().replace('&', " and ");
    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
