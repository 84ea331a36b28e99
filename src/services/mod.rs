pub mod aggregation_service;
pub mod history_service;
pub mod job_scheduler_service;
pub mod mercenary_service;
pub mod price_service;
pub mod series_service;
