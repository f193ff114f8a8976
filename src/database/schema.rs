use sqlx::SqlitePool;

/// DDL for the tables the search core reads. Applied idempotently at startup
/// and by tests that run against `sqlite::memory:`.
const SQL_CREATE_TABLES: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS addresses (
    address_id TEXT PRIMARY KEY,
    line1      TEXT NOT NULL DEFAULT '',
    area       TEXT NOT NULL DEFAULT '',
    city       TEXT,
    state      TEXT,
    country    TEXT NOT NULL DEFAULT '',
    pincode    TEXT NOT NULL DEFAULT '',
    latitude   REAL,
    longitude  REAL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS workers (
    worker_id         TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    phone             TEXT NOT NULL DEFAULT '',
    email             TEXT,
    skills            TEXT NOT NULL DEFAULT '[]',
    experience_years  INTEGER NOT NULL DEFAULT 0,
    rating            REAL NOT NULL DEFAULT 0,
    total_reviews     INTEGER NOT NULL DEFAULT 0,
    price_per_service REAL NOT NULL DEFAULT 0,
    pay_type          TEXT NOT NULL DEFAULT 'hourly',
    service_radius_km INTEGER NOT NULL DEFAULT 25,
    status            TEXT NOT NULL DEFAULT 'INACTIVE',
    profile_visible   INTEGER NOT NULL DEFAULT 1,
    address_id        TEXT NOT NULL REFERENCES addresses(address_id)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS worker_subscriptions (
    subscription_id TEXT PRIMARY KEY,
    worker_id       TEXT NOT NULL REFERENCES workers(worker_id),
    status          TEXT NOT NULL,
    end_date        TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS service_types (
    service_type_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    slug            TEXT NOT NULL UNIQUE,
    is_active       INTEGER NOT NULL DEFAULT 1,
    sort_order      INTEGER NOT NULL DEFAULT 0
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_workers_status ON workers(status)",
    "CREATE INDEX IF NOT EXISTS idx_addresses_coords ON addresses(latitude, longitude)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_worker ON worker_subscriptions(worker_id)",
];

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SQL_CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
