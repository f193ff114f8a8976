use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;

use localpros::config::AppConfig;
use localpros::services::geocode_service::GeocodeClient;
use localpros::services::worker_geo_service;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await
        .expect("cannot connect to database");

    let limit: i64 = env::var("BACKFILL_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(500);

    let geocoder = GeocodeClient::new(config.google_maps_api_key.clone());

    match worker_geo_service::backfill_worker_geo(&pool, &geocoder, limit).await {
        Ok(report) => {
            println!(
                "geo backfill: candidates={}, updated={}, skipped={}, failed={}",
                report.candidates, report.updated, report.skipped, report.failed
            );
        }
        Err(e) => {
            eprintln!("geo backfill failed: {}", e);
            std::process::exit(1);
        }
    }
}
