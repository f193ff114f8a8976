pub mod catalog_service;
pub mod geo;
pub mod geocode_service;
pub mod geoip_service;
pub mod location_service;
pub mod worker_geo_service;
pub mod worker_search_service;
