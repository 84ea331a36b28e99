use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use tracing::{debug, error, info};

use crate::config::HistorySettings;
use crate::models::{
    DateRange, HistoryStats, ItemPrice, ItemSample, PriceHistoryDocument, PriceMap,
    PriceSnapshotEntry,
};
use crate::store::{KvClient, HISTORY_KEY};

/// Width of one fine-grained bucket in minutes.
pub const BUCKET_MINUTES: u32 = 5;

/// (date, hour, minute slot) of the bucket `now` falls into.
pub fn bucket_of(now: DateTime<Utc>) -> (NaiveDate, u32, u32) {
    let minute_slot = (now.minute() / BUCKET_MINUTES) * BUCKET_MINUTES;
    (now.date_naive(), now.hour(), minute_slot)
}

/// Rolling 5-minute price history kept as one document in the KV store.
///
/// Every read and write round-trips the whole document. Concurrent savers
/// from different processes are last-writer-wins.
#[derive(Clone)]
pub struct HistoryService {
    kv: Arc<KvClient>,
    settings: HistorySettings,
}

impl HistoryService {
    pub fn new(kv: Arc<KvClient>, settings: HistorySettings) -> Self {
        Self { kv, settings }
    }

    pub fn settings(&self) -> &HistorySettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.kv.is_available()
    }

    pub async fn read(&self) -> PriceHistoryDocument {
        self.read_at(Utc::now()).await
    }

    pub async fn read_at(&self, now: DateTime<Utc>) -> PriceHistoryDocument {
        self.kv
            .get::<PriceHistoryDocument>(HISTORY_KEY)
            .await
            .unwrap_or_else(|| PriceHistoryDocument::empty(now))
    }

    pub async fn save(&self, prices: &PriceMap) -> Option<PriceSnapshotEntry> {
        self.save_at(prices, Utc::now()).await
    }

    /// Record `prices` into the bucket containing `now`.
    ///
    /// Items without a positive minimum price are dropped. A second save
    /// into the same bucket replaces the first. Returns `None` when history
    /// is disabled or the write did not go through.
    pub async fn save_at(
        &self,
        prices: &PriceMap,
        now: DateTime<Utc>,
    ) -> Option<PriceSnapshotEntry> {
        if !self.kv.is_available() {
            debug!("History store unavailable, skipping snapshot save");
            return None;
        }

        let mut history = self.read_at(now).await;
        let (date, hour, minute_slot) = bucket_of(now);

        let entry = PriceSnapshotEntry {
            timestamp: now,
            date,
            hour,
            minute_slot,
            prices: prices
                .iter()
                .filter(|(_, info)| info.min_price > 0)
                .map(|(name, info)| (name.clone(), ItemPrice::from(info)))
                .collect(),
        };

        match history
            .entries
            .iter()
            .position(|e| e.bucket() == entry.bucket())
        {
            Some(index) => history.entries[index] = entry.clone(),
            None => history.entries.push(entry.clone()),
        }

        history.entries.sort_by_key(|e| e.timestamp);
        let max_entries = self.settings.max_entries;
        if history.entries.len() > max_entries {
            let excess = history.entries.len() - max_entries;
            history.entries.drain(..excess);
        }
        history.last_updated = now;

        if !self.kv.set(HISTORY_KEY, &history).await {
            error!(
                "Failed to persist price snapshot for {} {:02}:{:02}",
                date, hour, minute_slot
            );
            return None;
        }

        info!(
            "💾 Saved price snapshot {} {:02}:{:02} ({} items, {} entries retained)",
            date,
            hour,
            minute_slot,
            entry.prices.len(),
            history.entries.len()
        );
        Some(entry)
    }

    pub async fn get_latest(&self) -> Option<PriceSnapshotEntry> {
        self.read().await.entries.pop()
    }

    /// Chronological fine-grained samples for one item; empty when unknown.
    pub async fn get_item_history(&self, item_name: &str) -> Vec<ItemSample> {
        item_samples(&self.read().await, item_name)
    }

    pub async fn get_by_date(&self, date: NaiveDate) -> Vec<PriceSnapshotEntry> {
        self.read()
            .await
            .entries
            .into_iter()
            .filter(|e| e.date == date)
            .collect()
    }

    pub async fn get_stats(&self) -> HistoryStats {
        history_stats(&self.read().await)
    }

    /// Entries grouped by date for every date strictly before `cutoff`.
    pub async fn entries_before(&self, cutoff: NaiveDate) -> BTreeMap<NaiveDate, Vec<PriceSnapshotEntry>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<PriceSnapshotEntry>> = BTreeMap::new();
        for entry in self.read().await.entries {
            if entry.date < cutoff {
                grouped.entry(entry.date).or_default().push(entry);
            }
        }
        grouped
    }
}

pub fn item_samples(history: &PriceHistoryDocument, item_name: &str) -> Vec<ItemSample> {
    history
        .entries
        .iter()
        .filter_map(|e| e.sample_for(item_name))
        .collect()
}

pub fn history_stats(history: &PriceHistoryDocument) -> HistoryStats {
    let date_range = match (history.entries.first(), history.entries.last()) {
        (Some(first), Some(last)) => Some(DateRange {
            from: first.date,
            to: last.date,
        }),
        _ => None,
    };

    let items: BTreeSet<&str> = history
        .entries
        .iter()
        .flat_map(|e| e.prices.keys().map(String::as_str))
        .collect();

    HistoryStats {
        total_entries: history.entries.len(),
        date_range,
        item_count: items.len(),
        last_updated: history.last_updated,
    }
}
