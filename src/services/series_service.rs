//! Chart-facing transformations over an item's price series: merging the
//! fine-grained and daily resolutions, rolling statistics, and bounding
//! the number of points sent to the dashboard.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::{ChartPeriod, DailyAggregate, ItemHistoryWithDaily, ItemSample, PriceChange, SeriesStats};
use crate::services::aggregation_service::AggregationService;
use crate::services::history_service::HistoryService;

/// Fine-grained samples and daily aggregates for one item, read concurrently.
pub async fn get_item_history_with_daily(
    history: &HistoryService,
    aggregation: &AggregationService,
    item_name: &str,
) -> ItemHistoryWithDaily {
    let (detailed, daily) = tokio::join!(
        history.get_item_history(item_name),
        aggregation.get_item_daily(item_name),
    );
    ItemHistoryWithDaily { detailed, daily }
}

/// Reshape a daily aggregate into a sample pinned to noon UTC of its date.
pub fn daily_pseudo_sample(aggregate: &DailyAggregate) -> ItemSample {
    ItemSample {
        timestamp: noon_of(aggregate.date),
        date: aggregate.date,
        hour: 12,
        minute_slot: 0,
        min_price: aggregate.min_price,
        max_price: aggregate.max_price,
        avg_price: aggregate.avg_price,
        quantity: aggregate.total_quantity,
        is_daily: true,
    }
}

fn noon_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
        .and_utc()
}

/// Single chronological series; a date with fine-grained samples never
/// also shows its daily aggregate.
pub fn merge_with_daily(detailed: &[ItemSample], daily: &[DailyAggregate]) -> Vec<ItemSample> {
    let detailed_dates: HashSet<NaiveDate> = detailed.iter().map(|s| s.date).collect();

    let mut merged: Vec<ItemSample> = daily
        .iter()
        .filter(|d| !detailed_dates.contains(&d.date))
        .map(daily_pseudo_sample)
        .chain(detailed.iter().cloned())
        .collect();

    merged.sort_by_key(|s| s.timestamp);
    merged
}

/// High/low by minimum price (first occurrence wins) and the
/// quantity-weighted average price. Samples without a positive minimum
/// price are ignored.
pub fn series_stats(series: &[ItemSample]) -> SeriesStats {
    let priced: Vec<&ItemSample> = series.iter().filter(|s| s.min_price > 0).collect();
    let Some(first) = priced.first() else {
        return SeriesStats::default();
    };

    let mut high = *first;
    let mut low = *first;
    for &sample in &priced[1..] {
        if sample.min_price > high.min_price {
            high = sample;
        }
        if sample.min_price < low.min_price {
            low = sample;
        }
    }

    let total_quantity: u128 = priced.iter().map(|s| s.quantity as u128).sum();
    let weighted_avg_price = if total_quantity == 0 {
        0
    } else {
        let weighted: u128 = priced
            .iter()
            .map(|s| s.avg_price as u128 * s.quantity as u128)
            .sum();
        (weighted as f64 / total_quantity as f64).round() as u64
    };

    SeriesStats {
        historical_high: high.min_price,
        historical_high_at: Some(high.timestamp),
        historical_low: low.min_price,
        historical_low_at: Some(low.timestamp),
        weighted_avg_price,
        sample_count: priced.len(),
    }
}

/// Restrict the series to the period's window and reduce it to at most the
/// period's point budget.
pub fn downsample(series: &[ItemSample], period: ChartPeriod, now: DateTime<Utc>) -> Vec<ItemSample> {
    let windowed: Vec<ItemSample> = match period.window_start(now) {
        Some(start) => series.iter().filter(|s| s.timestamp >= start).cloned().collect(),
        None => series.to_vec(),
    };
    reduce_to_budget(windowed, period.point_budget())
}

/// Replace consecutive chunks of `ceil(len / budget)` samples with their
/// mean. Within-chunk extremes are smoothed away.
pub fn reduce_to_budget(series: Vec<ItemSample>, budget: usize) -> Vec<ItemSample> {
    if budget == 0 {
        return Vec::new();
    }
    if series.len() <= budget {
        return series;
    }

    let chunk_size = series.len().div_ceil(budget);
    series.chunks(chunk_size).map(chunk_mean).collect()
}

fn chunk_mean(chunk: &[ItemSample]) -> ItemSample {
    let mean = |value: fn(&ItemSample) -> u64| -> u64 {
        let sum: u128 = chunk.iter().map(|s| value(s) as u128).sum();
        (sum as f64 / chunk.len() as f64).round() as u64
    };

    let first = &chunk[0];
    ItemSample {
        timestamp: first.timestamp,
        date: first.date,
        hour: first.hour,
        minute_slot: first.minute_slot,
        min_price: mean(|s| s.min_price),
        max_price: mean(|s| s.max_price),
        avg_price: mean(|s| s.avg_price),
        quantity: mean(|s| s.quantity),
        is_daily: chunk.iter().all(|s| s.is_daily),
    }
}

/// Change of `current_price` against the sample before the latest one.
pub fn price_change(history: &[ItemSample], current_price: u64) -> Option<PriceChange> {
    if history.len() < 2 {
        return None;
    }
    let previous_price = history[history.len() - 2].min_price;
    let change = current_price as i64 - previous_price as i64;
    let change_percent = if previous_price > 0 {
        (change as f64 / previous_price as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };

    Some(PriceChange {
        change,
        change_percent,
        previous_price,
    })
}
