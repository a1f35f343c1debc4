mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Timelike, Utc};
use common::{parse_body, TestApp};
use scheduling_backend::domain::models::booking::{Booking, BookingStatus};
use scheduling_backend::domain::models::hold::SlotHold;
use scheduling_backend::domain::models::service::ServiceOffering;
use serde_json::json;

fn on_the_hour(from_now: Duration) -> DateTime<Utc> {
    (Utc::now() + from_now)
        .with_nanosecond(0)
        .unwrap()
        .with_second(0)
        .unwrap()
        .with_minute(0)
        .unwrap()
}

async fn book_at(app: &TestApp, provider_id: &str, service_id: &str, client: &str, start: DateTime<Utc>) -> serde_json::Value {
    app.book_slot(
        provider_id,
        service_id,
        client,
        &start.format("%Y-%m-%d").to_string(),
        &start.format("%H:%M").to_string(),
    )
    .await
}

async fn cancel(app: &TestApp, booking_id: &str, client: &str) -> axum::response::Response {
    app.request(
        "POST",
        &format!("/api/v1/bookings/{}/cancel", booking_id),
        Some((client, "client")),
        Some(json!({ "reason": "test" })),
    )
    .await
}

#[tokio::test]
async fn test_cancellation_fee_tiers() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.open_all_week(&provider_id).await;

    // Beyond 24h: free cancellation, full refund.
    let booking = book_at(&app, &provider_id, &service_id, "client-a", on_the_hour(Duration::hours(49))).await;
    let res = cancel(&app, booking["id"].as_str().unwrap(), "client-a").await;
    assert_eq!(res.status(), StatusCode::OK);
    let cancelled = parse_body(res).await;
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["cancellation_fee_pct"], 0);

    // Mid tier (4-24h): half the price kept.
    let booking = book_at(&app, &provider_id, &service_id, "client-b", on_the_hour(Duration::hours(6))).await;
    let res = cancel(&app, booking["id"].as_str().unwrap(), "client-b").await;
    let cancelled = parse_body(res).await;
    assert_eq!(cancelled["cancellation_fee_pct"], 50);

    // Inside 4h: full fee, nothing refunded.
    let booking = book_at(&app, &provider_id, &service_id, "client-c", on_the_hour(Duration::hours(3))).await;
    let res = cancel(&app, booking["id"].as_str().unwrap(), "client-c").await;
    let cancelled = parse_body(res).await;
    assert_eq!(cancelled["cancellation_fee_pct"], 100);

    let refunds = app.payments.refunds.lock().unwrap();
    let amounts: Vec<i64> = refunds.iter().map(|(_, cents)| *cents).collect();
    assert_eq!(amounts, vec![5000, 2500], "full refund, half refund, and none for the 100% tier");

    let events = app.notifier.events.lock().unwrap();
    assert!(events.contains(&("booking_cancelled".to_string(), "client-a".to_string())));
}

#[tokio::test]
async fn test_fee_boundary_is_inclusive_to_cheaper_tier() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    let service = app.state.service_repo.find_by_id(&service_id).await.unwrap().unwrap();

    let booking_at = |service: &ServiceOffering, start: DateTime<Utc>| {
        let hold = SlotHold::new(provider_id.clone(), "client-a".into(), service, start, Duration::seconds(120));
        Booking::from_hold(&hold, BookingStatus::Confirmed, None)
    };

    let now = Utc::now();
    assert_eq!(app.state.policy.compute_fee(&booking_at(&service, now + Duration::hours(24)), now), 0);
    assert_eq!(
        app.state.policy.compute_fee(&booking_at(&service, now + Duration::hours(23) + Duration::minutes(59)), now),
        50
    );
    assert_eq!(app.state.policy.compute_fee(&booking_at(&service, now + Duration::hours(4)), now), 50);
    assert_eq!(
        app.state.policy.compute_fee(&booking_at(&service, now + Duration::hours(3) + Duration::minutes(59)), now),
        100
    );
}

#[tokio::test]
async fn test_third_no_show_blocks_client() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.open_all_week(&provider_id).await;

    for offset in [5, 6, 7] {
        let booking = book_at(
            &app,
            &provider_id,
            &service_id,
            "client-a",
            on_the_hour(Duration::hours(offset)),
        )
        .await;
        let res = app
            .request(
                "POST",
                &format!("/api/v1/bookings/{}/no-show", booking["id"].as_str().unwrap()),
                Some(("desk-1", "receptionist")),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    // Third strike within the lookback window: reservation attempts bounce.
    let start = on_the_hour(Duration::hours(10));
    let res = app
        .hold_slot(
            &provider_id,
            &service_id,
            "client-a",
            &start.format("%Y-%m-%d").to_string(),
            &start.format("%H:%M").to_string(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = parse_body(res).await;
    assert_eq!(body["code"], "CLIENT_BLOCKED");
    assert!(body["blocked_until"].as_str().is_some());

    // Other clients are unaffected.
    let res = app
        .hold_slot(
            &provider_id,
            &service_id,
            "client-b",
            &start.format("%Y-%m-%d").to_string(),
            &start.format("%H:%M").to_string(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_two_no_shows_do_not_block() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.open_all_week(&provider_id).await;

    for offset in [5, 6] {
        let booking = book_at(
            &app,
            &provider_id,
            &service_id,
            "client-a",
            on_the_hour(Duration::hours(offset)),
        )
        .await;
        app.request(
            "POST",
            &format!("/api/v1/bookings/{}/no-show", booking["id"].as_str().unwrap()),
            Some(("desk-1", "receptionist")),
            None,
        )
        .await;
    }

    let start = on_the_hour(Duration::hours(10));
    let res = app
        .hold_slot(
            &provider_id,
            &service_id,
            "client-a",
            &start.format("%Y-%m-%d").to_string(),
            &start.format("%H:%M").to_string(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}
