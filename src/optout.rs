//! Consent-dialog opt-out orchestration.
//!
//! Given a page showing a consent manager, the orchestrator works out which
//! vendors to refuse and drives a [`PageAutomation`] backend through the
//! usual dialog shapes: per-vendor checkboxes first, then a save control,
//! and a blanket reject-all only when neither was found. The outcome is
//! always reported to the caller; a missing config or a scripting failure
//! becomes `success: false` with the reason attached.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SweepError;

/// Browser tab the consent dialog is showing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabId(pub i64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One vendor from the bundled registry snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorEntry {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Purpose tags; vendors serving only strictly necessary purposes are
    /// left opted in.
    #[serde(default)]
    pub purposes: Vec<String>,
}

const ESSENTIAL_PURPOSES: &[&str] = &["strictly_necessary", "essential"];

impl VendorEntry {
    pub fn is_essential(&self) -> bool {
        self.purposes
            .iter()
            .any(|p| ESSENTIAL_PURPOSES.contains(&p.as_str()))
    }
}

/// CSS selector strategies for the common consent-manager layouts.
/// `vendor_checkbox` templates carry an `{id}` placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorTable {
    #[serde(default)]
    pub vendor_checkbox: Vec<String>,
    #[serde(default)]
    pub save: Vec<String>,
    #[serde(default)]
    pub reject_all: String,
}

/// Drives clicks in a live page. Each call reports whether it actually hit
/// something, so the orchestrator knows when to fall back.
#[async_trait]
pub trait PageAutomation: Send + Sync {
    /// Unchecks the opt-out control for each vendor. True if at least one
    /// checkbox was found and toggled.
    async fn click_vendor_opt_outs(
        &self,
        tab: TabId,
        vendors: &[VendorEntry],
        selectors: &SelectorTable,
    ) -> Result<bool>;

    /// Presses the first matching save/confirm control.
    async fn click_save(&self, tab: TabId, selectors: &SelectorTable) -> Result<bool>;

    /// Presses the blanket reject-all control.
    async fn click_reject_all(&self, tab: TabId, selectors: &SelectorTable) -> Result<bool>;
}

/// What the caller gets back. Never an `Err`; the orchestrator folds every
/// failure into the payload.
#[derive(Debug, Clone, Serialize)]
pub struct OptOutOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct OptOutOrchestrator {
    vendors_path: PathBuf,
    selectors_path: PathBuf,
    automation: Option<Arc<dyn PageAutomation>>,
}

impl OptOutOrchestrator {
    pub fn new(
        vendors_path: impl Into<PathBuf>,
        selectors_path: impl Into<PathBuf>,
        automation: Option<Arc<dyn PageAutomation>>,
    ) -> Self {
        Self {
            vendors_path: vendors_path.into(),
            selectors_path: selectors_path.into(),
            automation,
        }
    }

    pub async fn run(&self, tab: TabId) -> OptOutOutcome {
        match self.attempt(tab).await {
            Ok(()) => {
                info!(%tab, "Bulk opt-out finished");
                OptOutOutcome {
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(%tab, "Bulk opt-out failed: {e:#}");
                OptOutOutcome {
                    success: false,
                    error: Some(format!("{e:#}")),
                }
            }
        }
    }

    async fn attempt(&self, tab: TabId) -> Result<()> {
        let automation = self
            .automation
            .as_ref()
            .ok_or_else(|| anyhow!("no page automation backend configured"))?;

        let vendors: Vec<VendorEntry> = load_json(&self.vendors_path).await?;
        let selectors: SelectorTable = load_json(&self.selectors_path).await?;

        let targets: Vec<VendorEntry> =
            vendors.into_iter().filter(|v| !v.is_essential()).collect();
        debug!(%tab, "Opting out of {} vendors", targets.len());

        let mut clicked = automation
            .click_vendor_opt_outs(tab, &targets, &selectors)
            .await?;
        // The save control is tried even when no checkbox matched; some
        // dialogs persist sensible defaults on save alone.
        clicked |= automation.click_save(tab, &selectors).await?;

        if !clicked {
            debug!(%tab, "No granular controls found, pressing reject-all");
            automation.click_reject_all(tab, &selectors).await?;
        }
        Ok(())
    }
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, SweepError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SweepError::ConfigLoad(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| SweepError::ConfigLoad(format!("malformed {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essential_vendors_are_flagged() {
        let vendors: Vec<VendorEntry> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Ads Inc", "purposes": ["ad_selection"]},
                {"id": 2, "name": "Core CDN", "purposes": ["essential", "measurement"]},
                {"id": 3, "name": "Consent Platform", "purposes": ["strictly_necessary"]}
            ]"#,
        )
        .unwrap();
        let flags: Vec<bool> = vendors.iter().map(VendorEntry::is_essential).collect();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_selector_table_parses_camel_case() {
        let table: SelectorTable = serde_json::from_str(
            r##"{
                "vendorCheckbox": ["[data-vendor-id=\"{id}\"] input"],
                "save": [".save-btn"],
                "rejectAll": "#reject-all"
            }"##,
        )
        .unwrap();
        assert_eq!(table.vendor_checkbox.len(), 1);
        assert_eq!(table.reject_all, "#reject-all");
    }
}
