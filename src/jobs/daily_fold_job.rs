//! Daily Fold Background Job
//!
//! Summarizes fine-grained history older than the retention window into one
//! aggregate per item per day, so long-range charts keep their data after
//! the detailed entries age out.
//!
//! # Job Schedule
//!
//! - **Production**: Daily at 00:10 UTC (0 10 0 * * *)
//! - **Test mode**: Every 2 minutes
//!
//! The run is idempotent. Dates that already have an aggregate are skipped,
//! so re-running after a partial failure only fills in what is missing.

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::info;

pub async fn fold_aged_history(ctx: JobContext) -> Result<JobResult, AppError> {
    if !ctx.history.is_enabled() {
        info!("📚 History store not configured, nothing to fold");
        return Ok(JobResult { items_processed: 0, items_failed: 0 });
    }

    let report = ctx.aggregation.fold_aged_entries().await;
    info!(
        "📚 Daily fold: {} dates scanned, {} created, {} already present",
        report.dates_scanned, report.aggregates_created, report.aggregates_skipped
    );

    if report.aggregates_created > 0 && !report.persisted {
        return Err(AppError::External(format!(
            "Failed to persist {} daily aggregates",
            report.aggregates_created
        )));
    }

    Ok(JobResult {
        items_processed: report.aggregates_created as i32,
        items_failed: 0,
    })
}
