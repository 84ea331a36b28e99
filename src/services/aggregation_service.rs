use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, error, info};

use crate::models::{DailyAggregate, DailyHistoryDocument, FoldReport, PriceSnapshotEntry};
use crate::services::history_service::HistoryService;
use crate::store::{KvClient, DAILY_HISTORY_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    min_price: u64,
    quantity: u64,
}

/// Item name -> the day's samples in document order. Built fresh for each
/// date group of a fold.
#[derive(Debug, Default)]
struct ItemSamples {
    by_item: BTreeMap<String, Vec<Sample>>,
}

impl ItemSamples {
    fn collect(entries: &[PriceSnapshotEntry]) -> Self {
        let mut samples = Self::default();
        for entry in entries {
            for (name, price) in &entry.prices {
                samples.by_item.entry(name.clone()).or_default().push(Sample {
                    min_price: price.min_price,
                    quantity: price.quantity,
                });
            }
        }
        samples
    }
}

fn summarize(date: NaiveDate, samples: &[Sample]) -> Option<DailyAggregate> {
    let min_price = samples.iter().map(|s| s.min_price).min()?;
    let max_price = samples.iter().map(|s| s.min_price).max()?;
    let total_quantity = samples.iter().map(|s| s.quantity).max()?;
    let sum: u128 = samples.iter().map(|s| s.min_price as u128).sum();
    let avg_price = (sum as f64 / samples.len() as f64).round() as u64;

    Some(DailyAggregate {
        date,
        min_price,
        max_price,
        avg_price,
        total_quantity,
    })
}

/// Folds aged fine-grained entries into the long-horizon daily document.
#[derive(Clone)]
pub struct AggregationService {
    kv: Arc<KvClient>,
    history: HistoryService,
}

impl AggregationService {
    pub fn new(kv: Arc<KvClient>, history: HistoryService) -> Self {
        Self { kv, history }
    }

    pub async fn read_daily(&self) -> DailyHistoryDocument {
        self.read_daily_at(Utc::now()).await
    }

    async fn read_daily_at(&self, now: DateTime<Utc>) -> DailyHistoryDocument {
        self.kv
            .get::<DailyHistoryDocument>(DAILY_HISTORY_KEY)
            .await
            .unwrap_or_else(|| DailyHistoryDocument::empty(now))
    }

    /// Daily aggregates for one item, oldest first; empty when unknown.
    pub async fn get_item_daily(&self, item_name: &str) -> Vec<DailyAggregate> {
        self.read_daily()
            .await
            .items
            .remove(item_name)
            .unwrap_or_default()
    }

    pub async fn fold_aged_entries(&self) -> FoldReport {
        self.fold_aged_entries_at(Utc::now()).await
    }

    /// Summarize every fine-grained date older than the retention cutoff.
    ///
    /// A (item, date) pair that already has an aggregate is never touched
    /// again. Folded entries stay in the fine-grained document until the
    /// save path evicts them. The daily document is written once, and only
    /// when something new was created.
    pub async fn fold_aged_entries_at(&self, now: DateTime<Utc>) -> FoldReport {
        let mut report = FoldReport::default();
        if !self.kv.is_available() {
            debug!("History store unavailable, skipping daily fold");
            return report;
        }

        let settings = self.history.settings();
        let cutoff = now.date_naive() - Duration::days(settings.retention_days);
        let aged = self.history.entries_before(cutoff).await;
        if aged.is_empty() {
            debug!("No fine-grained entries older than {}", cutoff);
            return report;
        }

        let mut daily = self.read_daily_at(now).await;

        for (date, entries) in &aged {
            report.dates_scanned += 1;

            for (item, samples) in ItemSamples::collect(entries).by_item {
                let series = daily.items.entry(item).or_default();
                if series.iter().any(|d| d.date == *date) {
                    report.aggregates_skipped += 1;
                    continue;
                }
                let Some(aggregate) = summarize(*date, &samples) else {
                    continue;
                };

                series.push(aggregate);
                series.sort_by_key(|d| d.date);
                if series.len() > settings.max_daily_entries {
                    let excess = series.len() - settings.max_daily_entries;
                    series.drain(..excess);
                }
                report.aggregates_created += 1;
            }
        }

        if report.aggregates_created == 0 {
            info!(
                "📚 Daily fold found nothing new ({} dates already aggregated)",
                report.dates_scanned
            );
            return report;
        }

        daily.last_updated = now;
        report.persisted = self.kv.set(DAILY_HISTORY_KEY, &daily).await;
        if report.persisted {
            info!(
                "📚 Folded {} dates into {} daily aggregates (cutoff {})",
                report.dates_scanned, report.aggregates_created, cutoff
            );
        } else {
            error!("Failed to persist daily aggregates for cutoff {}", cutoff);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistorySettings;
    use crate::models::{PriceInfo, PriceMap};
    use crate::store::MemoryBackend;
    use chrono::{TimeZone, Timelike};

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, hour, minute, 0).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn price_map(name: &str, min: u64, quantity: u64) -> PriceMap {
        let mut map = PriceMap::new();
        map.insert(
            name.to_string(),
            PriceInfo {
                item_name: name.to_string(),
                min_price: min,
                max_price: min * 2,
                avg_price: min,
                quantity,
                listings: Vec::new(),
                last_updated: at(1, 1, 0, 0),
            },
        );
        map
    }

    fn services(settings: HistorySettings) -> (HistoryService, AggregationService, MemoryBackend) {
        let backend = MemoryBackend::new();
        let kv = Arc::new(KvClient::with_backend(Arc::new(backend.clone())));
        let history = HistoryService::new(kv.clone(), settings);
        let aggregation = AggregationService::new(kv, history.clone());
        (history, aggregation, backend)
    }

    async fn seed_example(history: &HistoryService) {
        for (slot, (min, qty)) in [(100, 5), (150, 3), (120, 5)].into_iter().enumerate() {
            history
                .save_at(&price_map("X", min, qty), at(1, 1, 10, slot as u32 * 5))
                .await
                .unwrap();
        }
    }

    #[test]
    fn test_summarize_uses_max_quantity() {
        let samples = [
            Sample { min_price: 100, quantity: 5 },
            Sample { min_price: 150, quantity: 3 },
            Sample { min_price: 120, quantity: 5 },
        ];
        let aggregate = summarize(date(1, 1), &samples).unwrap();
        assert_eq!(
            aggregate,
            DailyAggregate {
                date: date(1, 1),
                min_price: 100,
                max_price: 150,
                avg_price: 123,
                total_quantity: 5,
            }
        );
        assert!(summarize(date(1, 1), &[]).is_none());
    }

    #[tokio::test]
    async fn test_fold_produces_daily_aggregate() {
        let (history, aggregation, _) = services(HistorySettings::default());
        seed_example(&history).await;

        let report = aggregation.fold_aged_entries_at(at(1, 10, 0, 0)).await;
        assert_eq!(report.dates_scanned, 1);
        assert_eq!(report.aggregates_created, 1);
        assert!(report.persisted);

        let daily = aggregation.get_item_daily("X").await;
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].min_price, 100);
        assert_eq!(daily[0].max_price, 150);
        assert_eq!(daily[0].avg_price, 123);
        assert_eq!(daily[0].total_quantity, 5);
    }

    #[tokio::test]
    async fn test_fold_is_idempotent() {
        let (history, aggregation, backend) = services(HistorySettings::default());
        seed_example(&history).await;

        aggregation.fold_aged_entries_at(at(1, 10, 0, 0)).await;
        let first = backend.raw(DAILY_HISTORY_KEY).unwrap();

        let second = aggregation.fold_aged_entries_at(at(1, 10, 0, 5)).await;
        assert_eq!(second.aggregates_created, 0);
        assert_eq!(second.aggregates_skipped, 1);
        assert!(!second.persisted);
        assert_eq!(backend.raw(DAILY_HISTORY_KEY).unwrap(), first);
        assert_eq!(aggregation.get_item_daily("X").await.len(), 1);
    }

    #[tokio::test]
    async fn test_entries_inside_retention_are_not_folded() {
        let (history, aggregation, backend) = services(HistorySettings::default());
        seed_example(&history).await;

        // Cutoff is 2025-01-01 itself, which is not strictly older.
        let report = aggregation.fold_aged_entries_at(at(1, 8, 0, 0)).await;
        assert_eq!(report, FoldReport::default());
        assert!(backend.raw(DAILY_HISTORY_KEY).is_none());
    }

    #[tokio::test]
    async fn test_fold_does_not_evict_fine_grained_entries() {
        let (history, aggregation, _) = services(HistorySettings::default());
        seed_example(&history).await;

        aggregation.fold_aged_entries_at(at(1, 10, 0, 0)).await;
        assert_eq!(history.read().await.entries.len(), 3);
    }

    #[tokio::test]
    async fn test_fold_groups_by_date_and_item() {
        let (history, aggregation, _) = services(HistorySettings::default());
        history.save_at(&price_map("X", 10, 1), at(1, 1, 10, 0)).await.unwrap();
        history.save_at(&price_map("Y", 20, 2), at(1, 1, 10, 5)).await.unwrap();
        history.save_at(&price_map("X", 30, 3), at(1, 2, 10, 0)).await.unwrap();

        let report = aggregation.fold_aged_entries_at(at(1, 20, 0, 0)).await;
        assert_eq!(report.dates_scanned, 2);
        assert_eq!(report.aggregates_created, 3);

        let x = aggregation.get_item_daily("X").await;
        let dates: Vec<NaiveDate> = x.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(1, 1), date(1, 2)]);
        assert_eq!(aggregation.get_item_daily("Y").await.len(), 1);
        assert!(aggregation.get_item_daily("Z").await.is_empty());
    }

    #[tokio::test]
    async fn test_daily_series_is_capped() {
        let settings = HistorySettings {
            max_daily_entries: 2,
            ..HistorySettings::default()
        };
        let (history, aggregation, _) = services(settings);
        for day in 1..=4 {
            history.save_at(&price_map("X", day as u64, 1), at(1, day, 10, 0)).await.unwrap();
        }

        aggregation.fold_aged_entries_at(at(2, 1, 0, 0)).await;

        let x = aggregation.get_item_daily("X").await;
        let dates: Vec<NaiveDate> = x.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(1, 3), date(1, 4)]);
    }

    #[tokio::test]
    async fn test_steady_state_saves_are_folded_before_eviction() {
        let settings = HistorySettings::new(2);
        let (history, aggregation, _) = services(settings.clone());

        // One save every 5 minutes for 5 days, with the fold at 00:10 daily.
        // The price walks the slot of the day, so a complete day has
        // min 100 and max 100 + 287.
        let start = at(1, 1, 0, 0);
        for tick in 0..(5 * 24 * 12_i64) {
            let now = start + Duration::minutes(5 * tick);
            let slot_of_day = (tick % (24 * 12)) as u64;
            history.save_at(&price_map("X", 100 + slot_of_day, 1), now).await.unwrap();
            if now.hour() == 0 && now.minute() == 10 {
                aggregation.fold_aged_entries_at(now).await;
            }
        }

        assert!(history.read().await.entries.len() <= settings.max_entries);

        let daily = aggregation.get_item_daily("X").await;
        let dates: Vec<NaiveDate> = daily.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(1, 1), date(1, 2)]);
        for aggregate in &daily {
            assert_eq!(aggregate.min_price, 100);
            assert_eq!(aggregate.max_price, 100 + 287);
        }
    }

    #[tokio::test]
    async fn test_unavailable_store_skips_fold() {
        let kv = Arc::new(KvClient::unavailable());
        let history = HistoryService::new(kv.clone(), HistorySettings::default());
        let aggregation = AggregationService::new(kv, history);

        assert_eq!(aggregation.fold_aged_entries().await, FoldReport::default());
        assert!(aggregation.get_item_daily("X").await.is_empty());
    }
}
