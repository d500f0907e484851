use chrono::{DateTime, Utc};

use crate::hub::{AccountHub, SharedHub};

#[derive(Clone)]
pub struct AppState {
    pub hub: SharedHub,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(hub: SharedHub) -> Self {
        Self {
            hub,
            started_at: Utc::now(),
        }
    }

    pub fn from_hub(hub: AccountHub) -> Self {
        Self::new(hub.into_shared())
    }
}
