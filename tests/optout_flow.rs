use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crumbsweep::optout::{
    OptOutOrchestrator, PageAutomation, SelectorTable, TabId, VendorEntry,
};

const VENDORS: &str = r#"[
    {"id": 755, "name": "Google Advertising Products", "purposes": ["ad_selection"]},
    {"id": 91, "name": "Criteo", "purposes": ["ad_selection", "personalisation"]},
    {"id": 141, "name": "Sourcepoint CMP", "purposes": ["strictly_necessary"]}
]"#;

const SELECTORS: &str = r##"{
    "vendorCheckbox": ["[data-vendor-id=\"{id}\"] input"],
    "save": [".save-btn"],
    "rejectAll": "#reject-all"
}"##;

/// Automation double that records the click sequence and returns scripted
/// hit/miss results.
struct ScriptedPage {
    calls: Mutex<Vec<String>>,
    vendors_hit: bool,
    save_hit: bool,
    fail: bool,
}

impl ScriptedPage {
    fn new(vendors_hit: bool, save_hit: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            vendors_hit,
            save_hit,
            fail: false,
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageAutomation for ScriptedPage {
    async fn click_vendor_opt_outs(
        &self,
        _tab: TabId,
        vendors: &[VendorEntry],
        _selectors: &SelectorTable,
    ) -> Result<bool> {
        if self.fail {
            anyhow::bail!("consent dialog vanished mid-script");
        }
        self.calls
            .lock()
            .unwrap()
            .push(format!("vendors:{}", vendors.len()));
        Ok(self.vendors_hit)
    }

    async fn click_save(&self, _tab: TabId, _selectors: &SelectorTable) -> Result<bool> {
        self.calls.lock().unwrap().push("save".to_string());
        Ok(self.save_hit)
    }

    async fn click_reject_all(&self, _tab: TabId, _selectors: &SelectorTable) -> Result<bool> {
        self.calls.lock().unwrap().push("reject_all".to_string());
        Ok(true)
    }
}

struct Setup {
    _dir: tempfile::TempDir,
    vendors_path: std::path::PathBuf,
    selectors_path: std::path::PathBuf,
}

fn write_configs() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let vendors_path = dir.path().join("vendors.json");
    let selectors_path = dir.path().join("selectors.json");
    std::fs::write(&vendors_path, VENDORS).unwrap();
    std::fs::write(&selectors_path, SELECTORS).unwrap();
    Setup {
        _dir: dir,
        vendors_path,
        selectors_path,
    }
}

#[tokio::test]
async fn test_granular_path_skips_reject_all() {
    let setup = write_configs();
    let page = ScriptedPage::new(true, true);
    let orchestrator = OptOutOrchestrator::new(
        &setup.vendors_path,
        &setup.selectors_path,
        Some(page.clone() as Arc<dyn PageAutomation>),
    );

    let outcome = orchestrator.run(TabId(1)).await;
    assert!(outcome.success);
    assert_eq!(outcome.error, None);
    // The CMP vendor is essential and stays opted in; two targets remain.
    assert_eq!(page.calls(), ["vendors:2", "save"]);
}

#[tokio::test]
async fn test_save_alone_prevents_the_blanket_fallback() {
    let setup = write_configs();
    let page = ScriptedPage::new(false, true);
    let orchestrator = OptOutOrchestrator::new(
        &setup.vendors_path,
        &setup.selectors_path,
        Some(page.clone() as Arc<dyn PageAutomation>),
    );

    let outcome = orchestrator.run(TabId(1)).await;
    assert!(outcome.success);
    assert_eq!(page.calls(), ["vendors:2", "save"]);
}

#[tokio::test]
async fn test_reject_all_fires_when_nothing_matched() {
    let setup = write_configs();
    let page = ScriptedPage::new(false, false);
    let orchestrator = OptOutOrchestrator::new(
        &setup.vendors_path,
        &setup.selectors_path,
        Some(page.clone() as Arc<dyn PageAutomation>),
    );

    let outcome = orchestrator.run(TabId(1)).await;
    assert!(outcome.success);
    assert_eq!(page.calls(), ["vendors:2", "save", "reject_all"]);
}

#[tokio::test]
async fn test_missing_vendor_config_reports_failure() {
    let setup = write_configs();
    let page = ScriptedPage::new(true, true);
    let orchestrator = OptOutOrchestrator::new(
        setup._dir.path().join("nope.json"),
        &setup.selectors_path,
        Some(page.clone() as Arc<dyn PageAutomation>),
    );

    let outcome = orchestrator.run(TabId(1)).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("failed to read"));
    assert!(page.calls().is_empty());
}

#[tokio::test]
async fn test_scripting_error_is_folded_into_the_outcome() {
    let setup = write_configs();
    let page = Arc::new(ScriptedPage {
        calls: Mutex::new(Vec::new()),
        vendors_hit: false,
        save_hit: false,
        fail: true,
    });
    let orchestrator = OptOutOrchestrator::new(
        &setup.vendors_path,
        &setup.selectors_path,
        Some(page as Arc<dyn PageAutomation>),
    );

    let outcome = orchestrator.run(TabId(1)).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("vanished"));
}

#[tokio::test]
async fn test_without_backend_the_outcome_says_so() {
    let setup = write_configs();
    let orchestrator =
        OptOutOrchestrator::new(&setup.vendors_path, &setup.selectors_path, None);

    let outcome = orchestrator.run(TabId(1)).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("automation"));
}
