use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::daily::DailyAggregate;
use super::history::ItemSample;

/// Lookback windows offered by the dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartPeriod {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "all")]
    All,
}

impl ChartPeriod {
    /// `None` means the whole series is in the window.
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            ChartPeriod::Day => Some(Duration::days(1)),
            ChartPeriod::Week => Some(Duration::days(7)),
            ChartPeriod::Month => Some(Duration::days(30)),
            ChartPeriod::All => None,
        }
    }

    pub fn point_budget(&self) -> usize {
        match self {
            ChartPeriod::Day => 96,
            ChartPeriod::Week => 168,
            ChartPeriod::Month => 120,
            ChartPeriod::All => 200,
        }
    }

    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lookback().map(|d| now - d)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartPeriod::Day => "24h",
            ChartPeriod::Week => "7d",
            ChartPeriod::Month => "30d",
            ChartPeriod::All => "all",
        }
    }
}

impl FromStr for ChartPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "24h" | "1d" => Ok(ChartPeriod::Day),
            "7d" => Ok(ChartPeriod::Week),
            "30d" => Ok(ChartPeriod::Month),
            "all" => Ok(ChartPeriod::All),
            other => Err(format!(
                "Invalid period: {}. Must be one of 24h, 7d, 30d, all",
                other
            )),
        }
    }
}

/// Historical high/low and quantity-weighted average over a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    pub historical_high: u64,
    pub historical_high_at: Option<DateTime<Utc>>,
    pub historical_low: u64,
    pub historical_low_at: Option<DateTime<Utc>>,
    pub weighted_avg_price: u64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub change: i64,
    pub change_percent: f64,
    pub previous_price: u64,
}

/// Raw inputs for a merged item chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemHistoryWithDaily {
    pub detailed: Vec<ItemSample>,
    pub daily: Vec<DailyAggregate>,
}
