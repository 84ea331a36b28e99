//! Price Snapshot Background Job
//!
//! Pulls the current market listings for every tracked item and records
//! them as one fine-grained history entry.
//!
//! # Job Schedule
//!
//! - **Production**: Every 5 minutes (0 */5 * * * *)
//! - **Test mode**: Every minute
//!
//! Running more often than the 5-minute bucket width is harmless: saves
//! within the same bucket overwrite each other, so the history keeps at
//! most one entry per bucket.
//!
//! # Error Handling
//!
//! - Items the market fails to return are counted as failed and skipped
//! - A snapshot with no items at all fails the run and nothing is written
//! - A store write failure is logged by the history service; the job still
//!   reports how many items were fetched

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::price_service;
use tracing::{info, warn};

pub async fn record_price_snapshot(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("💰 Recording price snapshot for {} items...", ctx.tracked_items.len());

    let outcome = price_service::refresh_snapshot(
        ctx.snapshot_source.as_ref(),
        &ctx.history,
        &ctx.tracked_items,
        false,
    )
    .await;

    if outcome.prices.is_empty() {
        return Err(AppError::External("No item prices could be fetched".to_string()));
    }
    let fetched = outcome.prices.len();
    let failed = ctx.tracked_items.len().saturating_sub(fetched);

    match &outcome.saved {
        Some(entry) => info!(
            "📈 Snapshot stored for {} {:02}:{:02}",
            entry.date,
            entry.hour,
            entry.minute_slot
        ),
        None => warn!("Snapshot fetched but not stored"),
    }

    Ok(JobResult {
        items_processed: fetched as i32,
        items_failed: failed as i32,
    })
}
