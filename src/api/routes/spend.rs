use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::api::state::AppState;
use crate::spend::SpendSnapshot;

/// `GET /api/spend`: the current month's total.
///
/// Refreshes first so a month boundary passed since the last poll resets the
/// total even before new data arrives.
pub async fn monthly_spend(State(state): State<AppState>) -> Json<SpendSnapshot> {
    let mut hub = state.hub.write().await;
    hub.refresh_spend(Utc::now());
    Json(hub.spend().snapshot())
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, seeded_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_monthly_spend() {
        let state = seeded_state();
        let app = build_router(state.clone());
        let (status, json) = get_json(app, "/api/spend").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 250.0);
        assert_eq!(json["processed_orders"], 1);

        // Reading again does not count the order twice
        let app = build_router(state);
        let (_, json) = get_json(app, "/api/spend").await;
        assert_eq!(json["total"], 250.0);
    }
}
