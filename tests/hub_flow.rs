//! End-to-end flow: poll a document from disk, persist, restart, poll again.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use rohlik_agent::api::{build_router, AppState};
use rohlik_agent::fetch::FileSource;
use rohlik_agent::hub::AccountHub;
use rohlik_agent::storage::{StateStore, StorageConfig};
use rohlik_agent::sync::Poller;

fn current_month() -> String {
    Utc::now()
        .with_timezone(&chrono_tz::Europe::Prague)
        .format("%Y-%m")
        .to_string()
}

fn write_document(dir: &TempDir, value: Value) -> std::path::PathBuf {
    let path = dir.path().join("account.json");
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn delivered_groceries() -> Value {
    json!({
        "id": 400,
        "orderTime": format!("{}-01T08:00:00.000+0100", current_month()),
        "priceComposition": {"total": {"amount": 300.0}}
    })
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::for_config(&StorageConfig::new(temp_dir.path().join("data")));

    // First run: one upcoming order, one delivered this month
    let path = write_document(
        &temp_dir,
        json!({
            "next_order": {"data": [{
                "id": 901,
                "status": "CONFIRMED",
                "deliverySlot": {
                    "since": "2099-03-02T18:00:00.000+0100",
                    "till": "2099-03-02T19:00:00.000+0100"
                }
            }]},
            "delivered_orders": [delivered_groceries()]
        }),
    );

    let mut first = AccountHub::new(chrono_tz::Europe::Prague, "CZK");
    first.restore(store.load().unwrap());
    let hub = first.into_shared();
    let poller = Poller::new(
        Box::new(FileSource::new(&path)),
        hub.clone(),
        std::time::Duration::from_secs(60),
    )
    .with_store(store.clone());

    let report = poller.poll_once().await.unwrap();
    assert_eq!(report.calendar.created, 1);
    assert_eq!(report.spend.total, 300.0);
    assert!(store.path().exists());

    // Second run: the upcoming order has been delivered and left the feed
    write_document(
        &temp_dir,
        json!({
            "next_order": [],
            "delivered_orders": [delivered_groceries(), {"id": 901, "status": "DELIVERED"}]
        }),
    );

    let mut second = AccountHub::new(chrono_tz::Europe::Prague, "CZK");
    second.restore(store.load().unwrap());
    let hub = second.into_shared();
    let poller = Poller::new(
        Box::new(FileSource::new(&path)),
        hub.clone(),
        std::time::Duration::from_secs(60),
    )
    .with_store(store.clone());

    let report = poller.poll_once().await.unwrap();
    assert_eq!(report.calendar.reconstructed, 1);
    assert_eq!(report.spend.counted, 0);
    assert_eq!(report.spend.total, 300.0);

    {
        let hub = hub.read().await;
        let events = hub.calendar().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "[Delivered] Order 901");
        assert_eq!(events[0].start.to_rfc3339(), "2099-03-02T18:00:00+01:00");
    }

    // The API serves the reconstructed event
    let app = build_router(AppState::new(hub));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/calendar/events?start=2099-03-01T00:00:00Z&end=2099-03-03T00:00:00Z")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["events"][0]["order_id"], "901");
}

#[tokio::test]
async fn test_failed_poll_keeps_previous_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_document(
        &temp_dir,
        json!({"delivered_orders": [delivered_groceries()]}),
    );

    let hub = AccountHub::new(chrono_tz::Europe::Prague, "CZK").into_shared();
    let poller = Poller::new(
        Box::new(FileSource::new(&path)),
        hub.clone(),
        std::time::Duration::from_secs(60),
    );
    poller.poll_once().await.unwrap();

    std::fs::write(&path, "not json").unwrap();
    assert!(poller.poll_once().await.is_err());

    let state = poller.state().await;
    assert_eq!(state.polls, 2);
    assert!(state.last_error.is_some());
    assert_eq!(hub.read().await.spend().total(), 300.0);
}
