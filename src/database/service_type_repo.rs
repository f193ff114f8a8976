use sqlx::SqlitePool;

use crate::models::ServiceTypeRow;

const SQL_LIST_ACTIVE_SERVICE_TYPES: &str = r#"
SELECT
  service_type_id,
  name,
  slug,
  is_active,
  sort_order
FROM service_types
WHERE is_active = 1
ORDER BY sort_order ASC, name ASC
"#;

pub async fn list_active(pool: &SqlitePool) -> sqlx::Result<Vec<ServiceTypeRow>> {
    sqlx::query_as::<_, ServiceTypeRow>(SQL_LIST_ACTIVE_SERVICE_TYPES)
        .fetch_all(pool)
        .await
}

const SQL_UPSERT_SERVICE_TYPE: &str = r#"
INSERT INTO service_types (service_type_id, name, slug, is_active, sort_order)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT(slug) DO UPDATE SET
  name = excluded.name,
  is_active = excluded.is_active,
  sort_order = excluded.sort_order
RETURNING service_type_id, name, slug, is_active, sort_order
"#;

pub async fn upsert(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    slug: &str,
    is_active: bool,
    sort_order: i64,
) -> sqlx::Result<ServiceTypeRow> {
    sqlx::query_as::<_, ServiceTypeRow>(SQL_UPSERT_SERVICE_TYPE)
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(if is_active { 1 } else { 0 })
        .bind(sort_order)
        .fetch_one(pool)
        .await
}
