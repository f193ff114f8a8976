pub mod schema;
pub mod service_type_repo;
pub mod worker_repo;
