use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use craftprice_backend::app;
use craftprice_backend::config::{AppConfig, HistorySettings};
use craftprice_backend::external::market_scraper::MarketScraper;
use craftprice_backend::external::price_source::SnapshotSource;
use craftprice_backend::logging::init_logging;
use craftprice_backend::services::aggregation_service::AggregationService;
use craftprice_backend::services::history_service::HistoryService;
use craftprice_backend::services::job_scheduler_service::{JobContext, JobSchedulerService};
use craftprice_backend::state::AppState;
use craftprice_backend::store::KvClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Initialize logging before anything else logs
    init_logging(&config.logging).context("Failed to initialize logging")?;

    if !config.history.covers_fold_window() {
        tracing::warn!(
            "⚠️ HISTORY_MAX_ENTRIES={} is shorter than the fold window ({} entries); entries may be evicted before they are folded",
            config.history.max_entries,
            HistorySettings::fold_window_entries(config.history.retention_days)
        );
    }

    let kv = Arc::new(KvClient::from_settings(&config.kv));
    let history = HistoryService::new(kv.clone(), config.history.clone());
    let aggregation = AggregationService::new(kv, history.clone());

    tracing::info!(
        "🏪 Tracking {} items from {} (server {})",
        config.scraper.tracked_items.len(),
        config.scraper.base_url,
        config.scraper.server_id
    );
    let snapshot_source: Arc<dyn SnapshotSource> = Arc::new(MarketScraper::new(&config.scraper));
    let tracked_items = Arc::new(config.scraper.tracked_items.clone());

    let mut scheduler = if config.scheduler.enabled {
        let context = JobContext {
            history: history.clone(),
            aggregation: aggregation.clone(),
            snapshot_source: snapshot_source.clone(),
            tracked_items: tracked_items.clone(),
        };
        let mut scheduler = JobSchedulerService::new(context, config.scheduler.clone())
            .await
            .context("Failed to create job scheduler")?;
        scheduler.start().await.context("Failed to start job scheduler")?;
        Some(scheduler)
    } else {
        tracing::info!("⏸️ Job scheduler disabled (JOB_SCHEDULER_ENABLED=false)");
        None
    };

    let state = AppState {
        history,
        aggregation,
        snapshot_source,
        tracked_items,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Craftprice backend running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.stop().await.context("Failed to stop job scheduler")?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("🛑 Shutdown signal received");
}
