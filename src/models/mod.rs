pub mod service_type;
pub mod worker;

pub use service_type::ServiceTypeRow;
pub use worker::{PayType, VisibilityPolicy, WorkerSearchRow, WorkerStatus};
