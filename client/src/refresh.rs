use std::{sync::Arc, time::Duration};

use log::{debug, error, trace};
use thiserror::Error;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use crate::orchestrator::SharedOrchestrator;

// RefreshScheduler must be behind a Arc to be accessed from the
// Orchestrator (to stop it) or from the tokio task
pub type SharedRefreshScheduler = Arc<RefreshScheduler>;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh scheduler is already running")]
    AlreadyRunning,
}

/// Keeps the displayed machine state fresh without user action: one
/// fetch immediately on start, then one per interval until stopped.
/// The whole schedule is a single abortable task — there is no
/// self-rescheduling structure that could outlive the session.
pub struct RefreshScheduler {
    // tokio task
    task: Mutex<Option<JoinHandle<()>>>,
    orchestrator: SharedOrchestrator,
    period: Duration,
}

impl RefreshScheduler {
    pub fn new(orchestrator: SharedOrchestrator, period: Duration) -> SharedRefreshScheduler {
        Arc::new(Self {
            task: Mutex::new(None),
            orchestrator,
            period,
        })
    }

    pub async fn start(self: &Arc<Self>) -> Result<(), RefreshError> {
        trace!("Starting refresh scheduler");

        if self.is_running().await {
            return Err(RefreshError::AlreadyRunning);
        }

        let zelf = Arc::clone(self);
        *self.task.lock().await = Some(tokio::spawn(async move {
            // results arriving after an invalidation are discarded by
            // the orchestrator, this captures which session we poll for
            let generation = zelf.orchestrator.generation();

            let mut ticker = interval(zelf.period);
            // the fetch is awaited inline, so a tick due while one is
            // still in flight is skipped and the schedule stays on its
            // original boundaries
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(e) = zelf.orchestrator.refresh_snapshot(generation).await {
                    if log::log_enabled!(log::Level::Error) {
                        error!("Error while refreshing machine state: {}", e);
                    }
                    // a failed tick never stops the schedule
                }
            }
        }));

        Ok(())
    }

    // Stop the internal loop. No tick can fire past this point.
    pub async fn stop(&self) {
        trace!("Stopping refresh scheduler");
        if let Some(handle) = self.task.lock().await.take() {
            if handle.is_finished() {
                debug!("Refresh scheduler task was already finished");
            } else {
                handle.abort();
            }
        }
    }

    // check that we have a task and that it is not finished
    pub async fn is_running(&self) -> bool {
        let task = self.task.lock().await;
        if let Some(handle) = task.as_ref() {
            !handle.is_finished()
        } else {
            false
        }
    }
}
