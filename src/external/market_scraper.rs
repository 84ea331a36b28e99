use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::config::ScraperSettings;
use crate::external::price_source::{SnapshotSource, SourceError};
use crate::models::{PriceInfo, PriceListing};

/// Listings kept per item in a snapshot.
pub const MAX_LISTINGS: usize = 10;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const UNKNOWN_SELLER: &str = "알 수 없음";

/// One offer pulled out of the market page payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub item_name: String,
    pub price: u64,
    pub quantity: u64,
    pub seller_name: String,
}

/// Reads the market search page and extracts listings from the JSON
/// embedded in its server-rendered payload.
pub struct MarketScraper {
    client: reqwest::Client,
    base_url: String,
    server_id: u32,
}

impl MarketScraper {
    pub fn new(settings: &ScraperSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: settings.base_url.clone(),
            server_id: settings.server_id,
        }
    }
}

fn primary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\\?"itemName\\?":\\?"([^"\\]+)\\?"[^}]*?\\?"totalQuantity\\?":\s*(\d+)[^}]*?\\?"sellerName\\?":\\?"([^"\\]*)\\?"[^}]*?\\?"price\\?":\s*(\d+)"#,
        )
        .expect("listing pattern is valid")
    })
}

fn fallback_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\\?"itemName\\?":\\?"([^"\\]+)\\?"[^}]*?\\?"price\\?":\s*(\d+)[^}]*?\\?"totalQuantity\\?":\s*(\d+)"#,
        )
        .expect("fallback listing pattern is valid")
    })
}

/// Extract every listing from a page body. The payload may be escaped
/// (`\"itemName\"`) or plain; when no record has the usual field order the
/// fallback order (price before quantity, no seller) is tried.
pub fn extract_listings(body: &str) -> Vec<RawListing> {
    let listings: Vec<RawListing> = primary_pattern()
        .captures_iter(body)
        .filter_map(|c| {
            let seller = c[3].to_string();
            Some(RawListing {
                item_name: c[1].to_string(),
                quantity: c[2].parse().ok()?,
                seller_name: if seller.is_empty() { UNKNOWN_SELLER.to_string() } else { seller },
                price: c[4].parse().ok()?,
            })
        })
        .collect();

    if !listings.is_empty() {
        return listings;
    }

    fallback_pattern()
        .captures_iter(body)
        .filter_map(|c| {
            Some(RawListing {
                item_name: c[1].to_string(),
                price: c[2].parse().ok()?,
                quantity: c[3].parse().ok()?,
                seller_name: UNKNOWN_SELLER.to_string(),
            })
        })
        .collect()
}

/// Price statistics over the listings matching `item_name` (exact or
/// containing). No match yields zero prices.
pub fn summarize_listings(item_name: &str, listings: &[RawListing], now: DateTime<Utc>) -> PriceInfo {
    let matched: Vec<&RawListing> = listings
        .iter()
        .filter(|l| l.item_name == item_name || l.item_name.contains(item_name))
        .collect();

    if matched.is_empty() {
        return PriceInfo::unlisted(item_name, now);
    }

    let min_price = matched.iter().map(|l| l.price).min().unwrap_or(0);
    let max_price = matched.iter().map(|l| l.price).max().unwrap_or(0);
    let total: u128 = matched.iter().map(|l| l.price as u128).sum();
    let avg_price = (total as f64 / matched.len() as f64).round() as u64;
    let quantity = matched.iter().map(|l| l.quantity).sum();

    PriceInfo {
        item_name: item_name.to_string(),
        min_price,
        max_price,
        avg_price,
        quantity,
        listings: matched
            .iter()
            .take(MAX_LISTINGS)
            .map(|l| PriceListing {
                price: l.price,
                quantity: l.quantity,
                seller_name: l.seller_name.clone(),
            })
            .collect(),
        last_updated: now,
    }
}

#[async_trait]
impl SnapshotSource for MarketScraper {
    async fn fetch_item(&self, item_name: &str) -> Result<PriceInfo, SourceError> {
        let server_id = self.server_id.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("serverId", server_id.as_str()), ("itemName", item_name)])
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SourceError::BadResponse(format!("HTTP status {}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(summarize_listings(item_name, &extract_listings(&body), Utc::now()))
    }
}
