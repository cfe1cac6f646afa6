//! Persisted run counters and flags.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{KeyValueStore, KEY_RUN_STATE};

/// Cumulative agent state, stored as one JSON document under `runState`.
/// Unknown fields in old documents deserialize to defaults, so the shape
/// can grow without migrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunState {
    /// Lifetime count of cookies removed, across all runs.
    pub cookies_cleared: u64,
    /// Unix millis of the last cycle that removed at least one cookie.
    pub last_clean: Option<u64>,
    /// Message from the most recent failed cycle; cleared on success.
    pub last_error: Option<String>,
    /// Whether scheduled protection is switched on.
    pub active: bool,
    /// Whether this install gets the premium feed band.
    pub elevated_tier: bool,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            cookies_cleared: 0,
            last_clean: None,
            last_error: None,
            active: false,
            elevated_tier: false,
        }
    }
}

impl RunState {
    /// Loads the stored state. An absent or unreadable document yields the
    /// defaults; a fresh install starts inactive with zero counters.
    pub async fn load(kv: &dyn KeyValueStore) -> Result<Self> {
        match kv.get(KEY_RUN_STATE).await.context("failed to read run state")? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(state) => Ok(state),
                Err(e) => {
                    warn!("Stored run state is unreadable ({e}), starting fresh");
                    Ok(Self::default())
                }
            },
            None => Ok(Self::default()),
        }
    }

    pub async fn persist(&self, kv: &dyn KeyValueStore) -> Result<()> {
        let raw = serde_json::to_string(self).context("failed to encode run state")?;
        kv.set(KEY_RUN_STATE, &raw).await
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
