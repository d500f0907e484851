pub mod calendar;
pub mod delivery;
pub mod spend;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub started_at: DateTime<Utc>,
    pub last_update: Option<DateTime<Utc>>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let last_update = state.hub.read().await.last_update();
    Json(HealthResponse {
        status: "ok",
        started_at: state.started_at,
        last_update,
    })
}
