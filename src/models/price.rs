use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single seller offer as listed on the market page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListing {
    pub price: u64,
    pub quantity: u64,
    pub seller_name: String,
}

/// Current price statistics for one item, as produced by a fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    pub item_name: String,
    pub min_price: u64,
    pub max_price: u64,
    pub avg_price: u64,
    pub quantity: u64,
    #[serde(default)]
    pub listings: Vec<PriceListing>,
    pub last_updated: DateTime<Utc>,
}

impl PriceInfo {
    /// Placeholder returned when the market has no matching listings.
    pub fn unlisted(item_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            item_name: item_name.to_string(),
            min_price: 0,
            max_price: 0,
            avg_price: 0,
            quantity: 0,
            listings: Vec::new(),
            last_updated: now,
        }
    }
}

/// Item name -> current price statistics.
pub type PriceMap = BTreeMap<String, PriceInfo>;
