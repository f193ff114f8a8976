#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceTypeRow {
    pub service_type_id: String,
    pub name: String,
    pub slug: String,
    pub is_active: i64,
    pub sort_order: i64,
}
