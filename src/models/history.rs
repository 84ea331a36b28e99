use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::price::{PriceInfo, PriceListing};

// ==============================================================================
// Stored documents
// ==============================================================================

/// Per-item prices recorded inside one snapshot bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPrice {
    pub min_price: u64,
    pub max_price: u64,
    pub avg_price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listings: Option<Vec<PriceListing>>,
}

impl From<&PriceInfo> for ItemPrice {
    fn from(info: &PriceInfo) -> Self {
        Self {
            min_price: info.min_price,
            max_price: info.max_price,
            avg_price: info.avg_price,
            quantity: info.quantity,
            listings: if info.listings.is_empty() {
                None
            } else {
                Some(info.listings.clone())
            },
        }
    }
}

/// One 5-minute bucket of prices for every tracked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshotEntry {
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub hour: u32,
    // Documents written before 5-minute bucketing existed carry no slot.
    #[serde(default)]
    pub minute_slot: u32,
    pub prices: BTreeMap<String, ItemPrice>,
}

impl PriceSnapshotEntry {
    pub fn bucket(&self) -> (NaiveDate, u32, u32) {
        (self.date, self.hour, self.minute_slot)
    }

    pub fn sample_for(&self, item_name: &str) -> Option<ItemSample> {
        self.prices.get(item_name).map(|p| ItemSample {
            timestamp: self.timestamp,
            date: self.date,
            hour: self.hour,
            minute_slot: self.minute_slot,
            min_price: p.min_price,
            max_price: p.max_price,
            avg_price: p.avg_price,
            quantity: p.quantity,
            is_daily: false,
        })
    }
}

/// The rolling fine-grained history, stored as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryDocument {
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<PriceSnapshotEntry>,
}

impl PriceHistoryDocument {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            entries: Vec::new(),
        }
    }
}

// ==============================================================================
// Query projections
// ==============================================================================

/// One point of an item's price series.
///
/// Raw samples come straight from a snapshot bucket; daily pseudo-samples
/// are aggregates pinned to noon of their date and flagged with `is_daily`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSample {
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub hour: u32,
    pub minute_slot: u32,
    pub min_price: u64,
    pub max_price: u64,
    pub avg_price: u64,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_daily: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_entries: usize,
    pub date_range: Option<DateRange>,
    pub item_count: usize,
    pub last_updated: DateTime<Utc>,
}
