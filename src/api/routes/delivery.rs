use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::state::AppState;
use crate::hub::AccountSummary;
use crate::models::{AccountOverview, DeliveryInfo, LastOrder, NextOrderWindow, PreselectedSlot};

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub delivery: Option<DeliveryInfo>,
    pub next_order: Option<NextOrderWindow>,
    pub preselected_slots: Vec<PreselectedSlot>,
    pub last_order: Option<LastOrder>,
}

/// `GET /api/delivery`: announcement, ETA, next window and slot offers.
pub async fn delivery(State(state): State<AppState>) -> Json<DeliveryResponse> {
    let hub = state.hub.read().await;
    Json(DeliveryResponse {
        delivery: hub.delivery_info(Utc::now()),
        next_order: hub.next_order(),
        preselected_slots: hub.preselected_slots(),
        last_order: hub.last_order(),
    })
}

/// `GET /api/account`: profile, premium, bags, first delivery and cart.
pub async fn account(State(state): State<AppState>) -> Json<AccountOverview> {
    Json(state.hub.read().await.account())
}

/// `GET /api/summary`
///
/// Takes the write lock: the spend total is refreshed for the current month.
pub async fn summary(State(state): State<AppState>) -> Json<AccountSummary> {
    let mut hub = state.hub.write().await;
    Json(hub.summary(Utc::now()))
}
