use crate::config::SchedulerSettings;
use crate::errors::AppError;
use crate::external::price_source::SnapshotSource;
use crate::jobs::{daily_fold_job, price_snapshot_job};
use crate::services::aggregation_service::AggregationService;
use crate::services::history_service::HistoryService;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use chrono::Utc;
use std::sync::Arc;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub history: HistoryService,
    pub aggregation: AggregationService,
    pub snapshot_source: Arc<dyn SnapshotSource>,
    pub tracked_items: Arc<Vec<String>>,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    settings: SchedulerSettings,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext, settings: SchedulerSettings) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            settings,
        })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        let test_mode = self.settings.test_mode;
        if test_mode {
            info!("⚠️  JOB SCHEDULER IN TEST MODE - Jobs will run every minute!");
        }

        // format: sec min hour day month weekday
        let snapshot_schedule = if test_mode { "0 */1 * * * *".to_string() } else { self.settings.snapshot_schedule.clone() };
        let snapshot_desc = if test_mode { "Every minute (TEST MODE)" } else { "Every 5 minutes" };

        self.schedule_job(
            &snapshot_schedule,
            "price_snapshot",
            snapshot_desc,
            price_snapshot_job::record_price_snapshot
        ).await?;

        let fold_schedule = if test_mode { "0 */2 * * * *".to_string() } else { self.settings.fold_schedule.clone() };
        let fold_desc = if test_mode { "Every 2 minutes (TEST MODE)" } else { "Daily at 00:10 UTC" };

        self.schedule_job(
            &fold_schedule,
            "daily_fold",
            fold_desc,
            daily_fold_job::fold_aged_history
        ).await?;

        self.scheduler.start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler.shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler.add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

/// Run one job invocation and log its outcome and duration.
pub async fn execute_job<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>) -> Option<JobResult>
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
            Some(job_result)
        }
        Err(e) => {
            error!("❌ Job failed: {} - {} (duration: {}ms)", job_name, e, duration_ms);
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}
