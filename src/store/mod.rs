pub mod backend;
pub mod client;
pub mod memory;
pub mod upstash;

pub use backend::{KvBackend, StoreError};
pub use client::KvClient;
pub use memory::MemoryBackend;

/// Key of the rolling fine-grained history document.
pub const HISTORY_KEY: &str = "price-history";

/// Key of the per-item daily aggregate document.
pub const DAILY_HISTORY_KEY: &str = "price-history-daily";
