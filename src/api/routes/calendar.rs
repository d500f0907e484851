use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_instant, ApiError};
use crate::models::CalendarEvent;

/// Window used when `end` is omitted.
const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
pub struct CurrentEventResponse {
    pub event: Option<CalendarEvent>,
}

/// `GET /api/calendar/event`: the delivery in progress, else the next one.
pub async fn current_event(State(state): State<AppState>) -> Json<CurrentEventResponse> {
    let hub = state.hub.read().await;
    Json(CurrentEventResponse {
        event: hub.calendar().current_or_next_event(Utc::now()).cloned(),
    })
}

/// `GET /api/calendar/events?start=&end=`: events intersecting the range.
///
/// `start` defaults to now and `end` to 30 days after `start`.
pub async fn events_in_range(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<EventsResponse>, ApiError> {
    let start = parse_instant("start", params.start.as_deref())?.unwrap_or_else(Utc::now);
    let end = parse_instant("end", params.end.as_deref())?
        .unwrap_or_else(|| start + Duration::days(DEFAULT_RANGE_DAYS));

    if end <= start {
        return Err(ApiError::BadRequest("end must be after start".to_string()));
    }

    let hub = state.hub.read().await;
    let events = hub
        .calendar()
        .events_in_range(start, end)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(EventsResponse { start, end, events }))
}

/// `GET /api/calendar/events/:order_id`
pub async fn event_by_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<CalendarEvent>, ApiError> {
    let hub = state.hub.read().await;
    hub.calendar()
        .event(&order_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No calendar event for order {}", order_id)))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, seeded_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_current_event_is_next_upcoming() {
        let app = build_router(seeded_state());
        let (status, json) = get_json(app, "/api/calendar/event").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["event"]["order_id"], "900");
        assert_eq!(json["event"]["summary"], "Order 900");
    }

    #[tokio::test]
    async fn test_events_in_range() {
        let app = build_router(seeded_state());
        let (status, json) = get_json(
            app,
            "/api/calendar/events?start=2099-01-05T10:30:00%2B01:00&end=2099-01-05T11:30:00%2B01:00",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["events"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_events_in_range_excludes_touching_window() {
        let app = build_router(seeded_state());
        let (status, json) = get_json(
            app,
            "/api/calendar/events?start=2099-01-05T11:00:00%2B01:00&end=2099-01-05T12:00:00%2B01:00",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["events"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_events_in_range_rejects_bad_input() {
        let app = build_router(seeded_state());
        let (status, json) = get_json(app, "/api/calendar/events?start=tomorrow").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let app = build_router(seeded_state());
        let (status, _) = get_json(
            app,
            "/api/calendar/events?start=2099-01-05T12:00:00Z&end=2099-01-05T10:00:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_event_by_order() {
        let app = build_router(seeded_state());
        let (status, json) = get_json(app, "/api/calendar/events/900").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["order_id"], "900");
        assert_eq!(json["start"], "2099-01-05T10:00:00+01:00");
    }

    #[tokio::test]
    async fn test_event_by_unknown_order() {
        let app = build_router(seeded_state());
        let (status, json) = get_json(app, "/api/calendar/events/12345").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
