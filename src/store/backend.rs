use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Raw key-value access. Values are JSON text; typing happens in `KvClient`.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError>;

    fn name(&self) -> &'static str;
}
