//! Command implementations behind the local API.
//!
//! Every command follows the same shape: load the persisted run state,
//! load a fresh policy snapshot where needed, do the work, persist what
//! changed and hand back a serializable view.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::cleaner::CookieCleaner;
use crate::engine::policy::PolicyStore;
use crate::error::SweepError;
use crate::optout::{OptOutOrchestrator, OptOutOutcome, TabId};
use crate::state::{now_millis, RunState};
use crate::storage::KeyValueStore;
use crate::store::CookieStore;

/// Result of one on-demand or scheduled clean.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub state: RunState,
    pub success: bool,
    pub removed: u64,
    pub error: Option<String>,
}

/// Full snapshot for status displays: run state plus both effective lists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub state: RunState,
    pub allow_list: Vec<String>,
    pub deny_list: Vec<String>,
}

pub struct SweepService {
    kv: Arc<dyn KeyValueStore>,
    policy: PolicyStore,
    cleaner: CookieCleaner,
    optout: OptOutOrchestrator,
}

impl SweepService {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn CookieStore>,
        policy: PolicyStore,
        optout: OptOutOrchestrator,
    ) -> Self {
        Self {
            kv,
            policy,
            cleaner: CookieCleaner::new(cookies),
            optout,
        }
    }

    pub async fn current_run_state(&self) -> Result<RunState, SweepError> {
        RunState::load(self.kv.as_ref())
            .await
            .map_err(SweepError::storage)
    }

    async fn persist_run_state(&self, state: &RunState) -> Result<(), SweepError> {
        state
            .persist(self.kv.as_ref())
            .await
            .map_err(SweepError::storage)
    }

    /// Runs one clean cycle. Counters only move when cookies actually came
    /// out; an enumeration failure is recorded on the state and reported in
    /// the payload without touching them.
    pub async fn clean_now(&self) -> Result<CleanReport, SweepError> {
        let mut state = self.current_run_state().await?;
        let policy = self
            .policy
            .load(state.elevated_tier)
            .await
            .map_err(SweepError::storage)?;

        match self.cleaner.sweep(&policy).await {
            Ok(stats) => {
                if stats.removed > 0 {
                    state.cookies_cleared += stats.removed;
                    state.last_clean = Some(now_millis());
                }
                state.last_error = None;
                self.persist_run_state(&state).await?;
                Ok(CleanReport {
                    state,
                    success: true,
                    removed: stats.removed,
                    error: None,
                })
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Clean cycle aborted: {message}");
                state.last_error = Some(message.clone());
                self.persist_run_state(&state).await?;
                Ok(CleanReport {
                    state,
                    success: false,
                    removed: 0,
                    error: Some(message),
                })
            }
        }
    }

    pub async fn state(&self) -> Result<StateView, SweepError> {
        let state = self.current_run_state().await?;
        let policy = self
            .policy
            .load(state.elevated_tier)
            .await
            .map_err(SweepError::storage)?;
        Ok(StateView {
            state,
            allow_list: policy.allow_view(),
            deny_list: policy.deny_view(),
        })
    }

    /// Flips the persisted protection flag, returning the new state. The
    /// scheduler reacts to the returned flag; this only records intent.
    pub async fn toggle_auto_protect(&self) -> Result<RunState, SweepError> {
        let mut state = self.current_run_state().await?;
        state.active = !state.active;
        self.persist_run_state(&state).await?;
        Ok(state)
    }

    /// One-way switch onto the premium feed band.
    pub async fn upgrade_tier(&self) -> Result<RunState, SweepError> {
        let mut state = self.current_run_state().await?;
        state.elevated_tier = true;
        self.persist_run_state(&state).await?;
        Ok(state)
    }

    pub async fn add_allow(&self, domain: &str) -> Result<Vec<String>, SweepError> {
        let state = self.current_run_state().await?;
        self.policy.add_allow(domain, state.elevated_tier).await
    }

    pub async fn remove_allow(&self, domain: &str) -> Result<Vec<String>, SweepError> {
        let state = self.current_run_state().await?;
        self.policy.remove_allow(domain, state.elevated_tier).await
    }

    pub async fn add_deny(&self, domain: &str) -> Result<Vec<String>, SweepError> {
        let state = self.current_run_state().await?;
        self.policy.add_deny(domain, state.elevated_tier).await
    }

    pub async fn remove_deny(&self, domain: &str) -> Result<Vec<String>, SweepError> {
        let state = self.current_run_state().await?;
        self.policy.remove_deny(domain, state.elevated_tier).await
    }

    pub async fn opt_out(&self, tab: TabId) -> OptOutOutcome {
        self.optout.run(tab).await
    }
}
