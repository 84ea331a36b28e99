use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one item's fine-grained samples for a single calendar day.
///
/// `total_quantity` is the highest quantity seen that day, not a sum: the
/// same listings are sampled many times a day and summing would count them
/// once per sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub min_price: u64,
    pub max_price: u64,
    pub avg_price: u64,
    pub total_quantity: u64,
}

/// Long-horizon per-item daily series, stored as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHistoryDocument {
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub items: BTreeMap<String, Vec<DailyAggregate>>,
}

impl DailyHistoryDocument {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            items: BTreeMap::new(),
        }
    }
}

/// Outcome of one fold run, reported back to the scheduler and the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldReport {
    pub dates_scanned: usize,
    pub aggregates_created: usize,
    pub aggregates_skipped: usize,
    pub persisted: bool,
}
