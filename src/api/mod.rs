//! REST API endpoints.
//!
//! Read-only axum API over the shared account hub: calendar queries,
//! monthly spend, delivery and account details.

pub mod routes;
pub mod state;

pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Parse an optional RFC 3339 query parameter.
pub fn parse_instant(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    ApiError::BadRequest(format!("{} must be an RFC 3339 timestamp: {}", name, raw))
                })
        })
        .transpose()
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/calendar/event", get(routes::calendar::current_event))
        .route("/api/calendar/events", get(routes::calendar::events_in_range))
        .route(
            "/api/calendar/events/:order_id",
            get(routes::calendar::event_by_order),
        )
        .route("/api/spend", get(routes::spend::monthly_spend))
        .route("/api/delivery", get(routes::delivery::delivery))
        .route("/api/account", get(routes::delivery::account))
        .route("/api/summary", get(routes::delivery::summary))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
