//! Background Jobs Module
//!
//! Jobs scheduled by the job scheduler service. They run independently of
//! user requests and share the same history and aggregation services the
//! HTTP layer uses.
//!
//! # Available Jobs
//!
//! - `price_snapshot_job` - Fetches tracked item prices and records a history entry
//! - `daily_fold_job` - Folds history older than the retention window into daily aggregates
//!
//! Both jobs are idempotent and safe to re-run.

pub mod daily_fold_job;
pub mod price_snapshot_job;
