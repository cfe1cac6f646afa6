//! Durable key-value state.
//!
//! All persisted agent state lives under three well-known keys, each holding
//! a JSON document. Only user-entered policy entries are written; feed
//! contributions are merged at load time and never persisted.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use async_trait::async_trait;

pub const KEY_RUN_STATE: &str = "runState";
pub const KEY_ALLOW_LIST: &str = "allowList";
pub const KEY_DENY_LIST: &str = "denyList";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Writes all entries as one logical update, so related keys cannot be
    /// observed half-written.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<()>;
}
