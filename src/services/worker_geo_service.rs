use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::worker_repo;
use crate::database::worker_repo::AddressGeoCandidateRow;
use crate::error::ApiError;
use crate::services::geocode_service::GeocodeClient;

/// Outcome of a backfill run over worker addresses missing coordinates.
#[derive(Debug, Default)]
pub struct WorkerGeoBackfillReport {
    pub candidates: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Geocodes worker addresses that have no stored coordinates yet. This is
/// the only path that writes coordinates; search always reads what is
/// stored. Repeated city/pincode combinations within one run hit an in-run
/// cache instead of the provider.
pub async fn backfill_worker_geo(
    pool: &SqlitePool,
    geocoder: &GeocodeClient,
    limit: i64,
) -> Result<WorkerGeoBackfillReport, ApiError> {
    let candidates = worker_repo::list_addresses_missing_geo(pool, limit)
        .await
        .map_err(|e| {
            warn!("geo backfill candidate query failed: {}", e);
            ApiError::upstream("Failed to load addresses for backfill.", e)
        })?;

    let mut report = WorkerGeoBackfillReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    let mut cache: HashMap<String, (f64, f64)> = HashMap::new();

    for row in candidates {
        if row.latitude.is_some() && row.longitude.is_some() {
            report.skipped += 1;
            continue;
        }

        let queries = build_queries(&row);
        let mut chosen: Option<(f64, f64)> = None;

        for query in queries {
            let cache_key = query.to_lowercase();
            if let Some(coords) = cache.get(&cache_key).copied() {
                chosen = Some(coords);
                break;
            }

            match geocoder.resolve(&query).await {
                Ok(coords) => {
                    cache.insert(cache_key, (coords.latitude, coords.longitude));
                    chosen = Some((coords.latitude, coords.longitude));
                    break;
                }
                Err(ApiError::NotFound(_)) => continue,
                Err(e) => {
                    warn!("📍 Geocode failed during backfill: {}", e);
                    chosen = None;
                    break;
                }
            }
        }

        let Some((lat, lon)) = chosen else {
            warn!("📍 No coords found for address {}", row.address_id);
            report.failed += 1;
            continue;
        };

        let updated = worker_repo::update_address_geo(pool, &row.address_id, lat, lon)
            .await
            .map_err(|e| {
                warn!("geo backfill update failed: {}", e);
                ApiError::upstream("Failed to store backfilled coordinates.", e)
            })?;
        if updated > 0 {
            report.updated += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        "📍 Worker geo backfill done: candidates={}, updated={}, skipped={}, failed={}",
        report.candidates, report.updated, report.skipped, report.failed
    );

    Ok(report)
}

/// Query candidates from most to least specific; duplicates removed
/// case-insensitively.
fn build_queries(row: &AddressGeoCandidateRow) -> Vec<String> {
    let clean = |v: &str| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    };

    let line1 = clean(&row.line1);
    let area = clean(&row.area);
    let city = row.city.as_deref().and_then(clean);
    let state = row.state.as_deref().and_then(clean);
    let country = clean(&row.country);
    let pincode = clean(&row.pincode);

    let mut queries = Vec::new();

    let full = [&line1, &area, &city, &state, &pincode, &country]
        .iter()
        .filter_map(|part| part.as_deref())
        .collect::<Vec<_>>()
        .join(", ");
    if !full.is_empty() {
        queries.push(full);
    }

    if let (Some(city), Some(state)) = (&city, &state) {
        queries.push(format!("{}, {}", city, state));
    }
    if let Some(city) = &city {
        queries.push(city.clone());
    }
    if let Some(pincode) = &pincode {
        queries.push(pincode.clone());
    }

    let mut seen = std::collections::HashSet::new();
    queries
        .into_iter()
        .filter(|q| seen.insert(q.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line1: &str, city: Option<&str>, state: Option<&str>, pincode: &str) -> AddressGeoCandidateRow {
        AddressGeoCandidateRow {
            address_id: "a-1".to_string(),
            line1: line1.to_string(),
            area: String::new(),
            city: city.map(str::to_string),
            state: state.map(str::to_string),
            country: "IN".to_string(),
            pincode: pincode.to_string(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn queries_go_from_specific_to_broad() {
        let queries = build_queries(&row(
            "12 Main Road",
            Some("Ranchi"),
            Some("Jharkhand"),
            "834001",
        ));
        assert_eq!(
            queries,
            vec![
                "12 Main Road, Ranchi, Jharkhand, 834001, IN".to_string(),
                "Ranchi, Jharkhand".to_string(),
                "Ranchi".to_string(),
                "834001".to_string(),
            ]
        );
    }

    #[test]
    fn blank_parts_are_skipped_and_duplicates_removed() {
        let queries = build_queries(&row("", Some("Ranchi"), None, ""));
        assert_eq!(
            queries,
            vec!["Ranchi, IN".to_string(), "Ranchi".to_string()]
        );
    }
}
