use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::{VisibilityPolicy, WorkerSearchRow};

/// Hard cap on rows pulled out of the store before exact distance filtering.
/// The bounding-box prefilter keeps this from scanning the whole table; the
/// engine logs when the cap is actually hit.
pub const CANDIDATE_CAP: i64 = 500;

pub const SQL_WORKER_SEARCH_BASE: &str = r#"
SELECT
    w.worker_id, w.name, w.phone, w.email,
    w.skills AS skills_json,
    w.experience_years, w.rating, w.total_reviews,
    w.price_per_service, w.pay_type, w.service_radius_km,
    w.status, w.profile_visible,
    a.city, a.state, a.latitude, a.longitude
FROM workers w
JOIN addresses a ON a.address_id = w.address_id
WHERE 1 = 1
"#;

/// Visibility predicate per policy. Must stay in sync with
/// `WorkerSearchRow::is_visible`.
fn visibility_sql(policy: VisibilityPolicy) -> &'static str {
    match policy {
        VisibilityPolicy::StatusOnly => " AND w.status = 'ACTIVE' AND w.profile_visible = 1",
        VisibilityPolicy::StatusAndSubscription => {
            " AND w.status = 'ACTIVE' AND w.profile_visible = 1 \
             AND EXISTS ( \
                SELECT 1 FROM worker_subscriptions s \
                WHERE s.worker_id = w.worker_id \
                  AND s.status = 'ACTIVE' \
                  AND s.end_date >= datetime('now') \
             )"
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub bbox: Option<(f64, f64, f64, f64)>,
    pub require_coords: bool,
    pub max_rate: Option<f64>,
}

/// Visible workers matching the coarse SQL filters. Skill matching and exact
/// distance checks happen in the engine, on at most `CANDIDATE_CAP` rows.
pub async fn list_candidates(
    pool: &SqlitePool,
    policy: VisibilityPolicy,
    filter: &CandidateFilter,
) -> sqlx::Result<Vec<WorkerSearchRow>> {
    let mut sql = String::from(SQL_WORKER_SEARCH_BASE);
    sql.push_str(visibility_sql(policy));
    let mut args = SqliteArguments::default();

    if filter.require_coords {
        sql.push_str(" AND a.latitude IS NOT NULL AND a.longitude IS NOT NULL");
    }

    if let Some(max_rate) = filter.max_rate {
        sql.push_str(" AND w.price_per_service <= ?");
        args.add(max_rate);
    }

    if let Some((min_lat, max_lat, min_lon, max_lon)) = filter.bbox {
        sql.push_str(" AND a.latitude BETWEEN ? AND ? AND a.longitude BETWEEN ? AND ?");
        args.add(min_lat);
        args.add(max_lat);
        args.add(min_lon);
        args.add(max_lon);
    }

    sql.push_str(" ORDER BY w.worker_id LIMIT ?");
    args.add(CANDIDATE_CAP);

    sqlx::query_as_with::<_, WorkerSearchRow, _>(&sql, args)
        .fetch_all(pool)
        .await
}

/// Explicitly-requested randomized sample of visible workers.
pub async fn sample_random(
    pool: &SqlitePool,
    policy: VisibilityPolicy,
    limit: i64,
) -> sqlx::Result<Vec<WorkerSearchRow>> {
    let mut sql = String::from(SQL_WORKER_SEARCH_BASE);
    sql.push_str(visibility_sql(policy));
    sql.push_str(" ORDER BY RANDOM() LIMIT ?");

    sqlx::query_as::<_, WorkerSearchRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct AddressGeoCandidateRow {
    pub address_id: String,
    pub line1: String,
    pub area: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub pincode: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

const SQL_LIST_ADDRESSES_MISSING_GEO: &str = r#"
SELECT
  a.address_id,
  a.line1,
  a.area,
  a.city,
  a.state,
  a.country,
  a.pincode,
  a.latitude,
  a.longitude
FROM addresses a
JOIN workers w ON w.address_id = a.address_id
WHERE (a.latitude IS NULL OR a.longitude IS NULL)
ORDER BY a.address_id ASC
LIMIT ?
"#;

pub async fn list_addresses_missing_geo(
    pool: &SqlitePool,
    limit: i64,
) -> sqlx::Result<Vec<AddressGeoCandidateRow>> {
    sqlx::query_as::<_, AddressGeoCandidateRow>(SQL_LIST_ADDRESSES_MISSING_GEO)
        .bind(limit)
        .fetch_all(pool)
        .await
}

const SQL_UPDATE_ADDRESS_GEO: &str = r#"
UPDATE addresses
SET latitude = ?, longitude = ?
WHERE address_id = ?
"#;

pub async fn update_address_geo(
    pool: &SqlitePool,
    address_id: &str,
    latitude: f64,
    longitude: f64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_ADDRESS_GEO)
        .bind(latitude)
        .bind(longitude)
        .bind(address_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
