use std::net::SocketAddr;

use crate::models::mercenary;

/// Fine-grained buckets per hour (5-minute resolution).
pub const BUCKETS_PER_HOUR: usize = 12;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    /// Days of fine-grained history kept before folding into daily aggregates.
    pub retention_days: i64,
    pub max_entries: usize,
    pub max_daily_entries: usize,
}

impl HistorySettings {
    pub fn new(retention_days: i64) -> Self {
        Self {
            retention_days,
            max_entries: Self::fold_window_entries(retention_days),
            max_daily_entries: 365,
        }
    }

    /// Smallest fine-grained window that still holds every bucket of the
    /// newest date older than the fold cutoff when the fold runs just after
    /// midnight: the retention days, the day being folded, and one day of
    /// slack for a late or skipped run.
    pub fn fold_window_entries(retention_days: i64) -> usize {
        (retention_days.max(0) as usize + 2) * 24 * BUCKETS_PER_HOUR
    }

    /// False when `max_entries` evicts dates before the fold can read them.
    pub fn covers_fold_window(&self) -> bool {
        self.max_entries >= Self::fold_window_entries(self.retention_days)
    }

    pub fn from_env() -> Self {
        let defaults = Self::new(env_or("HISTORY_RETENTION_DAYS", 7));
        Self {
            max_entries: env_or("HISTORY_MAX_ENTRIES", defaults.max_entries).max(1),
            max_daily_entries: env_or("HISTORY_MAX_DAILY_ENTRIES", defaults.max_daily_entries).max(1),
            ..defaults
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self::new(7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvBackendKind {
    Rest,
    Memory,
}

#[derive(Debug, Clone)]
pub struct KvSettings {
    pub backend: KvBackendKind,
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl KvSettings {
    pub fn from_env() -> Self {
        let backend = match std::env::var("KV_BACKEND")
            .unwrap_or_else(|_| "rest".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => KvBackendKind::Memory,
            _ => KvBackendKind::Rest,
        };

        Self {
            backend,
            url: env_non_empty("KV_REST_API_URL").or_else(|| env_non_empty("UPSTASH_REDIS_REST_URL")),
            token: env_non_empty("KV_REST_API_TOKEN").or_else(|| env_non_empty("UPSTASH_REDIS_REST_TOKEN")),
            timeout_secs: env_or("KV_TIMEOUT_SECS", 10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub server_id: u32,
    pub timeout_secs: u64,
    pub tracked_items: Vec<String>,
}

impl ScraperSettings {
    pub fn from_env() -> Self {
        let tracked_items = match env_non_empty("TRACKED_ITEMS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => mercenary::all_unique_items(),
        };

        Self {
            base_url: env_non_empty("MARKET_BASE_URL")
                .unwrap_or_else(|| "https://geota.co.kr/gersang/yukeuijeon".to_string()),
            server_id: env_or("MARKET_SERVER_ID", 5),
            timeout_secs: env_or("MARKET_TIMEOUT_SECS", 15),
            tracked_items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub test_mode: bool,
    pub snapshot_schedule: String,
    pub fold_schedule: String,
}

impl SchedulerSettings {
    pub fn from_env() -> Self {
        Self {
            enabled: env_or("JOB_SCHEDULER_ENABLED", true),
            test_mode: env_or("JOB_SCHEDULER_TEST_MODE", false),
            snapshot_schedule: env_non_empty("PRICE_SNAPSHOT_SCHEDULE")
                .unwrap_or_else(|| "0 */5 * * * *".to_string()),
            fold_schedule: env_non_empty("DAILY_FOLD_SCHEDULE")
                .unwrap_or_else(|| "0 10 0 * * *".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, from `RUST_LOG`.
    pub level: String,
    pub service_name: String,
    pub environment: String,
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
}

impl LoggingSettings {
    pub fn from_env() -> Self {
        Self {
            level: env_non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            service_name: env_non_empty("SERVICE_NAME").unwrap_or_else(|| "craftprice".to_string()),
            environment: env_non_empty("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            loki_enabled: env_or("LOKI_ENABLED", false),
            loki_url: env_non_empty("LOKI_URL"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "craftprice".to_string(),
            environment: "development".to_string(),
            loki_enabled: false,
            loki_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub logging: LoggingSettings,
    pub history: HistorySettings,
    pub kv: KvSettings,
    pub scraper: ScraperSettings,
    pub scheduler: SchedulerSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000))),
            logging: LoggingSettings::from_env(),
            history: HistorySettings::from_env(),
            kv: KvSettings::from_env(),
            scraper: ScraperSettings::from_env(),
            scheduler: SchedulerSettings::from_env(),
        }
    }
}
