use axum::{routing::get, Router};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use localpros::config::AppConfig;
use localpros::database::schema;
use localpros::web::routes::{geocode, geoip, health, search, services, workers};
use localpros::web::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Validate configuration up front: a missing geocoding credential
    //    should kill the process here, not a request later.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠️  Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 3. Connect to the database
    println!("Connecting to database: {}", config.database_url);
    let pool = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await
        .expect("cannot connect to database");

    schema::ensure_schema(&pool)
        .await
        .expect("cannot apply database schema");

    let state = AppState::new(pool, &config);

    // 4. Build the application
    let app = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/workers", get(workers::list_workers_handler))
        .route("/api/search/workers", get(search::search_workers_handler))
        .route("/api/geocode", get(geocode::geocode_handler))
        .route("/api/geoip", get(geoip::geoip_handler))
        .route(
            "/api/services",
            get(services::list_services_handler).post(services::create_service_handler),
        )
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        // State
        .with_state(state);

    // 5. Start the server (with fallback port)
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "⚠️  Could not bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                config.host,
                config.port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", config.host, config.port + 1)
                .parse()
                .expect("cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("🚀 LocalPros API running on http://{}", bound_addr);
    println!(
        "📍 Visibility policy: {}",
        config.visibility_policy.as_str()
    );

    axum::serve(listener, app).await.unwrap();
}
