use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{KvBackendKind, KvSettings};
use crate::store::backend::KvBackend;
use crate::store::memory::MemoryBackend;
use crate::store::upstash::{KvCredentials, UpstashBackend};

/// Document store handle shared by the history services.
///
/// The REST connection is created on first use and only once. Without
/// credentials the client is unavailable: reads return `None`, writes
/// return `false`, and nothing is ever raised to the caller.
pub struct KvClient {
    credentials: Option<KvCredentials>,
    timeout: Duration,
    backend: OnceLock<Arc<dyn KvBackend>>,
}

impl KvClient {
    pub fn from_settings(settings: &KvSettings) -> Self {
        if settings.backend == KvBackendKind::Memory {
            info!("🗄️ Using in-memory KV backend (history is not persisted across restarts)");
            return Self::with_backend(Arc::new(MemoryBackend::new()));
        }

        let credentials = match (&settings.url, &settings.token) {
            (Some(url), Some(token)) => Some(KvCredentials {
                url: url.clone(),
                token: token.clone(),
            }),
            _ => {
                warn!("⚠️ KV credentials not configured, price history is disabled");
                None
            }
        };

        Self {
            credentials,
            timeout: Duration::from_secs(settings.timeout_secs),
            backend: OnceLock::new(),
        }
    }

    pub fn with_backend(backend: Arc<dyn KvBackend>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(backend);
        Self {
            credentials: None,
            timeout: Duration::from_secs(10),
            backend: cell,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            credentials: None,
            timeout: Duration::from_secs(10),
            backend: OnceLock::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.get().is_some() || self.credentials.is_some()
    }

    fn backend(&self) -> Option<&Arc<dyn KvBackend>> {
        if let Some(backend) = self.backend.get() {
            return Some(backend);
        }
        let credentials = self.credentials.as_ref()?;
        Some(self.backend.get_or_init(|| {
            info!("🔌 Connecting to KV REST endpoint");
            Arc::new(UpstashBackend::new(credentials, self.timeout))
        }))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend()?;

        let raw = match backend.get_raw(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                error!("KV read failed for key {} ({}): {}", key, backend.name(), e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("KV value for key {} could not be decoded: {}", key, e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let Some(backend) = self.backend() else {
            return false;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to encode value for key {}: {}", key, e);
                return false;
            }
        };

        match backend.set_raw(key, raw).await {
            Ok(()) => true,
            Err(e) => {
                error!("KV write failed for key {} ({}): {}", key, backend.name(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        value: u32,
    }

    #[tokio::test]
    async fn test_unavailable_client_is_a_no_op() {
        let client = KvClient::unavailable();
        assert!(!client.is_available());
        assert!(client.get::<Doc>("k").await.is_none());
        assert!(!client.set("k", &Doc { value: 1 }).await);
    }

    #[tokio::test]
    async fn test_missing_token_disables_rest_backend() {
        let settings = KvSettings {
            backend: KvBackendKind::Rest,
            url: Some("https://example.upstash.io".to_string()),
            token: None,
            timeout_secs: 1,
        };
        let client = KvClient::from_settings(&settings);
        assert!(!client.is_available());
        assert!(!client.set("k", &Doc { value: 1 }).await);
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let client = KvClient::with_backend(Arc::new(MemoryBackend::new()));
        assert!(client.set("k", &Doc { value: 7 }).await);
        assert_eq!(client.get::<Doc>("k").await, Some(Doc { value: 7 }));
    }

    #[tokio::test]
    async fn test_undecodable_value_reads_as_absent() {
        let backend = MemoryBackend::new();
        backend.insert_raw("k", "not json");
        let client = KvClient::with_backend(Arc::new(backend));
        assert!(client.get::<Doc>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_failures_degrade() {
        let backend = MemoryBackend::new();
        let client = KvClient::with_backend(Arc::new(backend.clone()));
        assert!(client.set("k", &Doc { value: 1 }).await);

        backend.set_fail_reads(true);
        backend.set_fail_writes(true);
        assert!(client.get::<Doc>("k").await.is_none());
        assert!(!client.set("k", &Doc { value: 2 }).await);
    }
}
