use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

use crate::models::{PriceInfo, PriceMap};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Produces current price statistics for market items.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_item(&self, item_name: &str) -> Result<PriceInfo, SourceError>;
}

/// Fetch every item concurrently. Items whose fetch failed are left out of
/// the map; unlisted items come back with zero prices.
pub async fn fetch_snapshot(source: &dyn SnapshotSource, items: &[String]) -> PriceMap {
    let results = join_all(items.iter().map(|item| source.fetch_item(item))).await;

    let mut prices = PriceMap::new();
    for (item, result) in items.iter().zip(results) {
        match result {
            Ok(info) => {
                prices.insert(item.clone(), info);
            }
            Err(e) => warn!("Failed to fetch price for {}: {}", item, e),
        }
    }
    prices
}
