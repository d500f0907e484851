//! Poller.
//!
//! Drives the hub from an [`AccountSource`]:
//! 1. Fetch the account data document
//! 2. Apply it to the hub (calendar reconcile, spend refresh, observers)
//! 3. Persist the derived state

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info};

use crate::fetch::AccountSource;
use crate::hub::{SharedHub, UpdateReport};
use crate::storage::StateStore;

/// Errors that can occur during a poll.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// State of the poll loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollState {
    pub last_poll_started: Option<DateTime<Utc>>,
    pub last_poll_completed: Option<DateTime<Utc>>,
    pub last_status: PollStatus,
    pub last_error: Option<String>,
    pub polls: u64,
}

/// Periodically feeds fresh account data into a shared hub.
pub struct Poller {
    source: Box<dyn AccountSource>,
    hub: SharedHub,
    store: Option<StateStore>,
    interval: Duration,
    state: Arc<RwLock<PollState>>,
    cancel_token: Arc<RwLock<bool>>,
}

impl Poller {
    pub fn new(source: Box<dyn AccountSource>, hub: SharedHub, interval: Duration) -> Self {
        Self {
            source,
            hub,
            store: None,
            interval,
            state: Arc::new(RwLock::new(PollState::default())),
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    /// Persist hub state to `store` after every successful poll.
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn state(&self) -> PollState {
        self.state.read().await.clone()
    }

    /// Stop the periodic loop before its next tick.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    /// Fetch, apply and persist once.
    pub async fn poll_once(&self) -> Result<UpdateReport, SyncError> {
        {
            let mut state = self.state.write().await;
            state.last_poll_started = Some(Utc::now());
            state.last_status = PollStatus::Running;
        }

        let result = self.run_poll().await;

        let mut state = self.state.write().await;
        state.last_poll_completed = Some(Utc::now());
        state.polls += 1;
        match &result {
            Ok(_) => {
                state.last_status = PollStatus::Completed;
                state.last_error = None;
            }
            Err(e) => {
                state.last_status = PollStatus::Failed;
                state.last_error = Some(e.to_string());
            }
        }

        result
    }

    async fn run_poll(&self) -> Result<UpdateReport, SyncError> {
        info!("Polling account data from {}", self.source.describe());
        let data = self.source.fetch().await?;

        let (report, persisted) = {
            let mut hub = self.hub.write().await;
            let report = hub.apply_update(data, Utc::now());
            (report, hub.persisted_state())
        };

        if let Some(store) = &self.store {
            store.save(&persisted)?;
        }

        Ok(report)
    }

    /// Poll on a fixed interval until cancelled. Failed polls are logged and
    /// retried on the next tick.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut ticker = interval(self.interval);

        info!("Starting periodic poll every {:?}", self.interval);

        loop {
            ticker.tick().await;

            if *self.cancel_token.read().await {
                info!("Periodic poll stopped");
                break;
            }

            match self.poll_once().await {
                Ok(report) => {
                    info!(
                        "Poll completed: {} events, monthly spend {:.2}",
                        report.calendar.total, report.spend.total
                    );
                }
                Err(e) => {
                    error!("Poll failed: {}", e);
                }
            }
        }
    }
}
