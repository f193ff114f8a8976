/// Which workers are allowed to appear in search results. Picked once per
/// deployment (config), never per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPolicy {
    /// `status = ACTIVE` and the profile toggle is on.
    StatusOnly,
    /// `StatusOnly` plus an unexpired ACTIVE subscription record.
    StatusAndSubscription,
}

impl VisibilityPolicy {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "status_only" => Some(Self::StatusOnly),
            "status_and_subscription" => Some(Self::StatusAndSubscription),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusOnly => "status_only",
            Self::StatusAndSubscription => "status_and_subscription",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Active,
    Inactive,
    Suspended,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Suspended => "SUSPENDED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayType {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl PayType {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Search projection of a worker joined with its address. `skills` and
/// `distance` are filled in by the search engine after the row is fetched.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkerSearchRow {
    pub worker_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub skills_json: String,
    pub experience_years: i64,
    pub rating: f64,
    pub total_reviews: i64,
    pub price_per_service: f64,
    pub pay_type: String,
    pub service_radius_km: i64,
    pub status: String,
    pub profile_visible: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sqlx(skip)]
    pub skills: Vec<String>,
    #[sqlx(skip)]
    pub distance: Option<f64>,
}

impl WorkerSearchRow {
    /// Rust-side mirror of the SQL visibility predicate. The repo applies the
    /// same rule in the store query; the two must agree (covered by tests).
    pub fn is_visible(&self, policy: VisibilityPolicy, has_active_subscription: bool) -> bool {
        let base = self.status == WorkerStatus::Active.as_str() && self.profile_visible == 1;
        match policy {
            VisibilityPolicy::StatusOnly => base,
            VisibilityPolicy::StatusAndSubscription => base && has_active_subscription,
        }
    }
}
