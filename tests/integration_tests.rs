use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use localpros::database::{schema, service_type_repo, worker_repo};
use localpros::error::ApiError;
use localpros::models::VisibilityPolicy;
use localpros::services::catalog_service::{self, UpsertServiceType};
use localpros::services::geo::{self, Coordinates, DistanceUnit};
use localpros::services::worker_search_service::{
    self, SearchQuery, SearchTier, SkillMatch, SortKey,
};

const RANCHI: Coordinates = Coordinates {
    latitude: 23.3441,
    longitude: 85.3096,
};

async fn test_pool() -> SqlitePool {
    // A single connection: every handle of an in-memory SQLite database
    // must be the same connection or the tables vanish.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    schema::ensure_schema(&pool).await.expect("schema applies");
    pool
}

#[allow(clippy::too_many_arguments)]
async fn insert_worker(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    skills: &[&str],
    rating: f64,
    price: f64,
    experience_years: i64,
    service_radius_km: i64,
    status: &str,
    profile_visible: i64,
    coords: Option<(f64, f64)>,
) {
    let address_id = format!("addr-{}", id);
    sqlx::query(
        "INSERT INTO addresses (address_id, line1, area, city, state, country, pincode, latitude, longitude)
         VALUES (?, '12 Main Road', 'Lalpur', 'Ranchi', 'Jharkhand', 'IN', '834001', ?, ?)",
    )
    .bind(&address_id)
    .bind(coords.map(|c| c.0))
    .bind(coords.map(|c| c.1))
    .execute(pool)
    .await
    .expect("address inserts");

    let skills_json = serde_json::to_string(skills).expect("skills serialize");
    sqlx::query(
        "INSERT INTO workers (worker_id, name, phone, email, skills, experience_years, rating,
                              total_reviews, price_per_service, pay_type, service_radius_km,
                              status, profile_visible, address_id)
         VALUES (?, ?, '+91-9000000000', NULL, ?, ?, ?, 10, ?, 'hourly', ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(&skills_json)
    .bind(experience_years)
    .bind(rating)
    .bind(price)
    .bind(service_radius_km)
    .bind(status)
    .bind(profile_visible)
    .bind(&address_id)
    .execute(pool)
    .await
    .expect("worker inserts");
}

async fn insert_subscription(pool: &SqlitePool, worker_id: &str, status: &str, end_date: &str) {
    sqlx::query(
        "INSERT INTO worker_subscriptions (subscription_id, worker_id, status, end_date)
         VALUES (?, ?, ?, ?)",
    )
    .bind(format!("sub-{}-{}", worker_id, end_date))
    .bind(worker_id)
    .bind(status)
    .bind(end_date)
    .execute(pool)
    .await
    .expect("subscription inserts");
}

/// A point `km` kilometres due north of `from`, by the same spherical model
/// the engine uses.
fn north_of(from: Coordinates, km: f64) -> (f64, f64) {
    (from.latitude + km / 111.19, from.longitude)
}

fn strict_query(skills: &[&str], center: Coordinates, radius_km: f64) -> SearchQuery {
    SearchQuery {
        tier: SearchTier::Strict,
        skills: Some(skills.iter().map(|s| s.to_string()).collect()),
        coords: Some(center),
        radius: radius_km,
        unit: DistanceUnit::Km,
        skill_match: SkillMatch::Substring,
        ..Default::default()
    }
}

// A plumber 15 km out with a 20 km service radius matches a 25 km search.
#[tokio::test]
async fn strict_search_finds_worker_inside_both_radii() {
    let pool = test_pool().await;
    insert_worker(
        &pool,
        "w-plumber",
        "Asha Verma",
        &["Plumbing"],
        4.7,
        500.0,
        6,
        20,
        "ACTIVE",
        1,
        Some(north_of(RANCHI, 15.0)),
    )
    .await;

    let page = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, 25.0),
    )
    .await
    .unwrap();

    assert_eq!(page.count, 1);
    let hit = &page.results[0];
    assert_eq!(hit.id, "w-plumber");
    let distance = hit.distance.expect("distance annotated");
    assert!((14.5..15.5).contains(&distance), "got {}", distance);
}

// Wrong skill: empty result, not an error.
#[tokio::test]
async fn strict_search_with_unmatched_skill_is_empty_not_an_error() {
    let pool = test_pool().await;
    insert_worker(
        &pool,
        "w-plumber",
        "Asha Verma",
        &["Plumbing"],
        4.7,
        500.0,
        6,
        20,
        "ACTIVE",
        1,
        Some(north_of(RANCHI, 15.0)),
    )
    .await;

    let page = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Electrical"], RANCHI, 25.0),
    )
    .await
    .unwrap();

    assert_eq!(page.count, 0);
    assert!(page.results.is_empty());
}

// Non-positive radius is a validation error with the exact message.
#[tokio::test]
async fn negative_radius_is_rejected() {
    let pool = test_pool().await;
    let err = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, -5.0),
    )
    .await
    .unwrap_err();

    match err {
        ApiError::Validation(msg) => assert_eq!(msg, "radius must be a positive number"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

// Skills but no location: distance plays no part, the limit caps the page.
#[tokio::test]
async fn no_location_mode_filters_by_skill_only() {
    let pool = test_pool().await;
    for i in 0..3 {
        insert_worker(
            &pool,
            &format!("w-{}", i),
            &format!("Worker {}", i),
            &["Plumbing"],
            4.0 + i as f64 / 10.0,
            400.0,
            3,
            5,
            "ACTIVE",
            1,
            None,
        )
        .await;
    }
    insert_worker(
        &pool,
        "w-painter",
        "Painter",
        &["Painting"],
        5.0,
        900.0,
        10,
        5,
        "ACTIVE",
        1,
        None,
    )
    .await;

    let query = SearchQuery {
        skills: Some(vec!["Plumbing".to_string()]),
        limit: 2,
        ..Default::default()
    };
    let page = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();

    assert_eq!(page.count, 2);
    assert!(page.results.iter().all(|w| w.distance.is_none()));
    assert!(page
        .results
        .iter()
        .all(|w| w.skills.contains(&"Plumbing".to_string())));
}

// INACTIVE workers never show up, however well they match.
#[tokio::test]
async fn inactive_workers_are_invisible_in_every_mode() {
    let pool = test_pool().await;
    insert_worker(
        &pool,
        "w-inactive",
        "Gone Worker",
        &["Plumbing"],
        5.0,
        100.0,
        20,
        100,
        "INACTIVE",
        1,
        Some(north_of(RANCHI, 1.0)),
    )
    .await;

    let strict = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, 50.0),
    )
    .await
    .unwrap();
    assert_eq!(strict.count, 0);

    let browse = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &SearchQuery::default(),
    )
    .await
    .unwrap();
    assert_eq!(browse.count, 0);
}

#[tokio::test]
async fn strict_search_requires_skills_and_coordinates() {
    let pool = test_pool().await;

    let missing_skills = SearchQuery {
        tier: SearchTier::Strict,
        coords: Some(RANCHI),
        ..Default::default()
    };
    let err = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &missing_skills)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "service is required");

    let missing_coords = SearchQuery {
        tier: SearchTier::Strict,
        skills: Some(vec!["Plumbing".to_string()]),
        coords: None,
        ..Default::default()
    };
    let err = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &missing_coords)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "lat and lng are required");
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let pool = test_pool().await;
    let query = SearchQuery {
        tier: SearchTier::Strict,
        skills: Some(vec!["Plumbing".to_string()]),
        coords: Some(Coordinates::new(91.0, 0.0)),
        ..Default::default()
    };
    let err = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "lat or lng out of range");
}

// The radius bound is a closed interval: exactly-at-radius is in, just
// past it is out.
#[tokio::test]
async fn radius_boundary_is_inclusive() {
    let pool = test_pool().await;
    let (lat, lng) = north_of(RANCHI, 10.0);
    insert_worker(
        &pool,
        "w-edge",
        "Edge Worker",
        &["Plumbing"],
        4.0,
        300.0,
        3,
        100,
        "ACTIVE",
        1,
        Some((lat, lng)),
    )
    .await;

    let exact = geo::haversine_km(RANCHI.latitude, RANCHI.longitude, lat, lng);

    let at_radius = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, exact),
    )
    .await
    .unwrap();
    assert_eq!(at_radius.count, 1);

    let just_inside = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, exact - 0.001),
    )
    .await
    .unwrap();
    assert_eq!(just_inside.count, 0);
}

// The strict tier also honors the worker's own service radius; the browse
// tier deliberately does not.
#[tokio::test]
async fn worker_service_radius_binds_only_the_strict_tier() {
    let pool = test_pool().await;
    insert_worker(
        &pool,
        "w-short-reach",
        "Short Reach",
        &["Plumbing"],
        4.0,
        300.0,
        3,
        10,
        "ACTIVE",
        1,
        Some(north_of(RANCHI, 15.0)),
    )
    .await;

    let strict = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, 25.0),
    )
    .await
    .unwrap();
    assert_eq!(strict.count, 0);

    let browse = SearchQuery {
        tier: SearchTier::Browse,
        skills: Some(vec!["Plumbing".to_string()]),
        coords: Some(RANCHI),
        radius: 25.0,
        unit: DistanceUnit::Km,
        ..Default::default()
    };
    let page = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &browse)
        .await
        .unwrap();
    assert_eq!(page.count, 1);
}

// Equal distances fall back to the requested sort key.
#[tokio::test]
async fn equal_distance_ties_break_on_the_requested_sort() {
    let pool = test_pool().await;
    let spot = north_of(RANCHI, 5.0);
    insert_worker(
        &pool, "w-low", "Low Rated", &["Plumbing"], 3.1, 300.0, 3, 50, "ACTIVE", 1, Some(spot),
    )
    .await;
    insert_worker(
        &pool, "w-high", "High Rated", &["Plumbing"], 4.9, 300.0, 3, 50, "ACTIVE", 1, Some(spot),
    )
    .await;

    let page = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &strict_query(&["Plumbing"], RANCHI, 25.0),
    )
    .await
    .unwrap();

    assert_eq!(page.count, 2);
    assert_eq!(page.results[0].id, "w-high");
    assert_eq!(page.results[1].id, "w-low");
}

#[tokio::test]
async fn browse_sorts_by_the_requested_key_even_with_location() {
    let pool = test_pool().await;
    insert_worker(
        &pool,
        "w-near-pricey",
        "Near But Pricey",
        &["Plumbing"],
        4.0,
        900.0,
        3,
        50,
        "ACTIVE",
        1,
        Some(north_of(RANCHI, 2.0)),
    )
    .await;
    insert_worker(
        &pool,
        "w-far-cheap",
        "Far But Cheap",
        &["Plumbing"],
        4.0,
        200.0,
        3,
        50,
        "ACTIVE",
        1,
        Some(north_of(RANCHI, 18.0)),
    )
    .await;

    let query = SearchQuery {
        tier: SearchTier::Browse,
        coords: Some(RANCHI),
        radius: 25.0,
        unit: DistanceUnit::Km,
        sort: SortKey::PriceAsc,
        ..Default::default()
    };
    let page = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();

    assert_eq!(page.count, 2);
    assert_eq!(page.results[0].id, "w-far-cheap");
    assert!(page.results.iter().all(|w| w.distance.is_some()));
}

#[tokio::test]
async fn browse_distances_come_back_in_miles_when_asked() {
    let pool = test_pool().await;
    insert_worker(
        &pool,
        "w-mi",
        "Miles Away",
        &["Plumbing"],
        4.0,
        300.0,
        3,
        50,
        "ACTIVE",
        1,
        Some(north_of(RANCHI, 16.0934)),
    )
    .await;

    let query = SearchQuery {
        tier: SearchTier::Browse,
        coords: Some(RANCHI),
        radius: 25.0,
        unit: DistanceUnit::Miles,
        ..Default::default()
    };
    let page = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();

    assert_eq!(page.count, 1);
    let distance = page.results[0].distance.unwrap();
    assert!((9.5..10.5).contains(&distance), "got {} miles", distance);
}

// Identical queries against an unchanged store return identical pages.
#[tokio::test]
async fn search_is_idempotent_without_random() {
    let pool = test_pool().await;
    for i in 0..8 {
        insert_worker(
            &pool,
            &format!("w-{}", i),
            &format!("Worker {}", i),
            &["Plumbing"],
            3.0 + (i % 4) as f64 / 2.0,
            200.0 + i as f64,
            i,
            50,
            "ACTIVE",
            1,
            Some(north_of(RANCHI, 1.0 + i as f64)),
        )
        .await;
    }

    let query = strict_query(&["Plumbing"], RANCHI, 25.0);
    let first = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();
    let second = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();

    assert_eq!(first.count, second.count);
    let ids = |page: &worker_search_service::SearchPage| {
        page.results.iter().map(|w| w.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

// "All Services" is a UI sentinel, not a category.
#[tokio::test]
async fn all_services_sentinel_means_no_filter() {
    let pool = test_pool().await;
    insert_worker(
        &pool, "w-1", "Worker", &["Roofing"], 4.0, 300.0, 3, 50, "ACTIVE", 1, None,
    )
    .await;

    let unfiltered = worker_search_service::search(
        &pool,
        VisibilityPolicy::StatusOnly,
        &SearchQuery::default(),
    )
    .await
    .unwrap();

    let sentinel = SearchQuery {
        skills: worker_search_service::parse_skill_list(Some("All Services")),
        ..Default::default()
    };
    let filtered = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &sentinel)
        .await
        .unwrap();

    assert_eq!(unfiltered.count, filtered.count);
    assert_eq!(unfiltered.count, 1);
}

#[tokio::test]
async fn subscription_policy_requires_an_unexpired_subscription() {
    let pool = test_pool().await;
    insert_worker(
        &pool, "w-paid", "Paid Up", &["Plumbing"], 4.0, 300.0, 3, 50, "ACTIVE", 1,
        Some(north_of(RANCHI, 5.0)),
    )
    .await;
    insert_worker(
        &pool, "w-lapsed", "Lapsed", &["Plumbing"], 4.0, 300.0, 3, 50, "ACTIVE", 1,
        Some(north_of(RANCHI, 5.0)),
    )
    .await;
    insert_subscription(&pool, "w-paid", "ACTIVE", "2999-01-01 00:00:00").await;
    insert_subscription(&pool, "w-lapsed", "ACTIVE", "2000-01-01 00:00:00").await;

    let query = strict_query(&["Plumbing"], RANCHI, 25.0);

    let status_only = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();
    assert_eq!(status_only.count, 2);

    let gated =
        worker_search_service::search(&pool, VisibilityPolicy::StatusAndSubscription, &query)
            .await
            .unwrap();
    assert_eq!(gated.count, 1);
    assert_eq!(gated.results[0].id, "w-paid");
}

// The SQL predicate and the Rust-side check must tell the same story.
#[tokio::test]
async fn sql_and_rust_visibility_agree() {
    let pool = test_pool().await;
    insert_worker(&pool, "w-ok", "Visible", &["Plumbing"], 4.0, 300.0, 3, 50, "ACTIVE", 1, None)
        .await;
    insert_worker(&pool, "w-off", "Hidden", &["Plumbing"], 4.0, 300.0, 3, 50, "ACTIVE", 0, None)
        .await;
    insert_worker(&pool, "w-out", "Inactive", &["Plumbing"], 4.0, 300.0, 3, 50, "INACTIVE", 1, None)
        .await;
    insert_subscription(&pool, "w-ok", "ACTIVE", "2999-01-01 00:00:00").await;

    for policy in [
        VisibilityPolicy::StatusOnly,
        VisibilityPolicy::StatusAndSubscription,
    ] {
        let rows = worker_repo::list_candidates(&pool, policy, &Default::default())
            .await
            .unwrap();
        for row in &rows {
            let has_active_subscription = row.worker_id == "w-ok";
            assert!(
                row.is_visible(policy, has_active_subscription),
                "SQL returned {} under {:?} but Rust disagrees",
                row.worker_id,
                policy
            );
        }
    }

    let gated = worker_repo::list_candidates(
        &pool,
        VisibilityPolicy::StatusAndSubscription,
        &Default::default(),
    )
    .await
    .unwrap();
    assert_eq!(gated.len(), 1);
    assert_eq!(gated[0].worker_id, "w-ok");
}

#[tokio::test]
async fn random_sampling_respects_visibility_and_limit() {
    let pool = test_pool().await;
    for i in 0..6 {
        insert_worker(
            &pool,
            &format!("w-{}", i),
            &format!("Worker {}", i),
            &["Plumbing"],
            4.0,
            300.0,
            3,
            50,
            if i == 0 { "INACTIVE" } else { "ACTIVE" },
            1,
            None,
        )
        .await;
    }

    let query = SearchQuery {
        random: true,
        limit: 3,
        ..Default::default()
    };
    let page = worker_search_service::search(&pool, VisibilityPolicy::StatusOnly, &query)
        .await
        .unwrap();

    assert_eq!(page.count, 3);
    assert!(page.results.iter().all(|w| w.id != "w-0"));
    assert!(page.results.iter().all(|w| w.distance.is_none()));
}

#[tokio::test]
async fn catalog_upsert_is_idempotent_per_slug() {
    let pool = test_pool().await;

    let first = catalog_service::upsert(
        &pool,
        UpsertServiceType {
            name: "AC Service & Repair".to_string(),
            slug: None,
            is_active: true,
            sort_order: 10,
        },
    )
    .await
    .unwrap();
    assert_eq!(first.slug, "ac-service-and-repair");

    let second = catalog_service::upsert(
        &pool,
        UpsertServiceType {
            name: "AC Service & Repair".to_string(),
            slug: Some("ac-service-and-repair".to_string()),
            is_active: true,
            sort_order: 4,
        },
    )
    .await
    .unwrap();
    assert_eq!(second.sort_order, 4);

    let listed = catalog_service::list_active(&pool).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, first.id);
}

#[tokio::test]
async fn inactive_catalog_entries_are_not_listed() {
    let pool = test_pool().await;
    service_type_repo::upsert(&pool, "st-1", "Plumbing", "plumbing", true, 1)
        .await
        .unwrap();
    service_type_repo::upsert(&pool, "st-2", "Old Service", "old-service", false, 2)
        .await
        .unwrap();

    let listed = catalog_service::list_active(&pool).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].slug, "plumbing");
}
