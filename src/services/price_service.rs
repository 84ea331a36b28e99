use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::external::price_source::{fetch_snapshot, SnapshotSource};
use crate::models::{PriceInfo, PriceMap, PriceSnapshotEntry};
use crate::services::history_service::HistoryService;

#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub prices: PriceMap,
    pub fetched_at: DateTime<Utc>,
    pub saved: Option<PriceSnapshotEntry>,
}

/// One fetch cycle: pull current prices for `items` and, unless
/// `skip_save`, record them in the fine-grained history. A cycle that
/// fetched nothing is never recorded.
pub async fn refresh_snapshot(
    source: &dyn SnapshotSource,
    history: &HistoryService,
    items: &[String],
    skip_save: bool,
) -> SnapshotOutcome {
    let prices = fetch_snapshot(source, items).await;
    let fetched_at = Utc::now();
    info!("💰 Fetched prices for {}/{} items", prices.len(), items.len());

    let saved = if skip_save || prices.is_empty() {
        None
    } else {
        let saved = history.save(&prices).await;
        if saved.is_none() && history.is_enabled() {
            warn!("Price snapshot was fetched but not recorded in history");
        }
        saved
    };

    SnapshotOutcome {
        prices,
        fetched_at,
        saved,
    }
}

/// The most recent stored snapshot reshaped as a price map.
pub async fn cached_prices(history: &HistoryService) -> Option<(DateTime<Utc>, PriceMap)> {
    let latest = history.get_latest().await?;
    let prices = latest
        .prices
        .into_iter()
        .map(|(name, p)| {
            let info = PriceInfo {
                item_name: name.clone(),
                min_price: p.min_price,
                max_price: p.max_price,
                avg_price: p.avg_price,
                quantity: p.quantity,
                listings: p.listings.unwrap_or_default(),
                last_updated: latest.timestamp,
            };
            (name, info)
        })
        .collect();
    Some((latest.timestamp, prices))
}
