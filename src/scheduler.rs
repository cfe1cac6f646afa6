//! Scheduled protection.
//!
//! When protection is on, a background task runs a clean cycle every
//! configured period. Toggling off aborts the task; a tick that was already
//! in flight when the flag dropped checks the flag again before sweeping,
//! so a disabled scheduler never cleans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::SweepError;
use crate::service::SweepService;
use crate::state::RunState;

pub struct ProtectionScheduler {
    service: Arc<SweepService>,
    period: Duration,
    active: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ProtectionScheduler {
    pub fn new(service: Arc<SweepService>, period: Duration) -> Self {
        Self {
            service,
            period,
            active: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Flips the persisted protection flag and arms or disarms the interval
    /// task to match.
    pub async fn toggle(&self) -> Result<RunState, SweepError> {
        let state = self.service.toggle_auto_protect().await?;
        self.apply(state.active);
        Ok(state)
    }

    /// Re-arms from the persisted flag. Called once at startup so a restart
    /// does not silently drop protection the user switched on.
    pub async fn restore(&self) -> Result<(), SweepError> {
        let state = self.service.current_run_state().await?;
        if state.active {
            self.apply(true);
        }
        Ok(())
    }

    fn apply(&self, active: bool) {
        if active {
            self.start();
        } else {
            self.stop();
        }
    }

    fn start(&self) {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            return;
        }
        self.active.store(true, Ordering::SeqCst);

        let service = self.service.clone();
        let flag = self.active.clone();
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately, skip it
            loop {
                interval.tick().await;
                // A tick raced with stop(): drop it instead of sweeping.
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                match service.clean_now().await {
                    Ok(report) => {
                        if let Some(error) = report.error {
                            warn!("Scheduled clean reported an error: {error}");
                        }
                    }
                    Err(e) => warn!("Scheduled clean failed: {e}"),
                }
            }
        }));
        info!("Auto-protection armed, sweeping every {}s", period.as_secs());
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
        info!("Auto-protection disarmed");
    }
}

impl Drop for ProtectionScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}
