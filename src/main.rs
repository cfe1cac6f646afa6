use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use crumbsweep::api;
use crumbsweep::config::Config;
use crumbsweep::engine::policy::PolicyStore;
use crumbsweep::init::{init_cookie_store, init_feed_source, init_state_store, setup_logging};
use crumbsweep::optout::OptOutOrchestrator;
use crumbsweep::scheduler::ProtectionScheduler;
use crumbsweep::service::SweepService;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting crumbsweep...");

    if !std::path::Path::new(&config_path).exists() {
        info!("Config file not found, using defaults.");
    }

    // 3. Open Backends
    let kv = init_state_store(&config)?;
    let cookies = init_cookie_store(&config)?;
    let feed = init_feed_source(&config)?;

    // 4. Build Policy Store & Verify the First Load
    let run_state = crumbsweep::state::RunState::load(kv.as_ref()).await?;
    let policy = PolicyStore::new(kv.clone(), feed);
    let policy_state = policy.load(run_state.elevated_tier).await?;
    info!(
        "Policy ready: {} allowlisted, {} denylisted domains",
        policy_state.allow_view().len(),
        policy_state.deny_view().len()
    );

    // 5. Build the Service
    // No page automation backend is wired in yet, so opt-out requests
    // report failure with a reason instead of silently no-opping.
    let optout = OptOutOrchestrator::new(
        config.optout.vendors_path.clone(),
        config.optout.selectors_path.clone(),
        None,
    );
    let service = Arc::new(SweepService::new(kv, cookies, policy, optout));

    // 6. Arm the Scheduler from Persisted State
    let period = Duration::from_secs(config.clean.interval_minutes * 60);
    let scheduler = Arc::new(ProtectionScheduler::new(service.clone(), period));
    scheduler.restore().await?;

    // 7. Start the Command API
    let api_service = service.clone();
    let api_scheduler = scheduler.clone();
    let api_port = config.api_port;
    let api_task = tokio::spawn(async move {
        api::start_api_server(api_service, api_scheduler, api_port).await;
    });

    // 8. Graceful Shutdown
    tokio::select! {
        _ = api_task => {},
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
