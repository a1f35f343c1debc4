mod common;

use axum::http::StatusCode;
use common::{next_monday, parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_hold_commit_creates_confirmed_booking() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let booking = app.book_slot(&provider_id, &service_id, "client-a", &next_monday(), "10:00").await;

    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["overbooked"], false);
    assert_eq!(booking["amount_cents"], 5000);
    assert!(booking["start_time"].as_str().unwrap().contains("T10:00:00"));

    let auths = app.payments.authorizations.lock().unwrap();
    assert_eq!(auths.len(), 1);
    assert_eq!(auths[0], ("client-a".to_string(), 5000));
    assert_eq!(app.payments.captures.lock().unwrap().len(), 1);

    let events = app.notifier.events.lock().unwrap();
    assert!(events.contains(&("booking_confirmed".to_string(), "client-a".to_string())));
}

#[tokio::test]
async fn test_taken_slot_fails_at_hold_time() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let date = next_monday();
    app.book_slot(&provider_id, &service_id, "client-a", &date, "10:00").await;

    let res = app.hold_slot(&provider_id, &service_id, "client-b", &date, "10:00").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert_eq!(body["code"], "SLOT_UNAVAILABLE");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_overbooking_allowance_then_hard_ceiling() {
    let app = TestApp::new().await;
    // base 1 + 100% overbooking: two occupants max per interval
    let provider_id = app.create_provider(&["hair"], 1, 1.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let date = next_monday();
    let first = app.book_slot(&provider_id, &service_id, "client-a", &date, "10:00").await;
    assert_eq!(first["overbooked"], false);

    let second_res = app.hold_slot(&provider_id, &service_id, "client-b", &date, "10:00").await;
    assert_eq!(second_res.status(), StatusCode::OK);
    let second_hold = parse_body(second_res).await;
    assert_eq!(second_hold["overbooked"], true, "second occupant rides the overbooking allowance");

    let third_res = app.hold_slot(&provider_id, &service_id, "client-c", &date, "10:00").await;
    assert_eq!(third_res.status(), StatusCode::CONFLICT);
    let body = parse_body(third_res).await;
    assert_eq!(body["code"], "OVERBOOKING_LIMIT_EXCEEDED");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_hold_expiry_releases_capacity() {
    let app = TestApp::with_ttls(1, 900).await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let date = next_monday();
    let hold_res = app.hold_slot(&provider_id, &service_id, "client-a", &date, "10:00").await;
    assert_eq!(hold_res.status(), StatusCode::OK);
    let stale_hold_id = parse_body(hold_res).await["id"].as_str().unwrap().to_string();

    let blocked = app.hold_slot(&provider_id, &service_id, "client-b", &date, "10:00").await;
    assert_eq!(blocked.status(), StatusCode::CONFLICT);

    tokio::time::sleep(std::time::Duration::from_millis(1300)).await;

    // The expired hold stopped counting toward occupancy.
    let retry = app.hold_slot(&provider_id, &service_id, "client-b", &date, "10:00").await;
    assert_eq!(retry.status(), StatusCode::OK);

    // A late commit of the stale hold must not resurrect it.
    let commit = app
        .request(
            "POST",
            &format!("/api/v1/holds/{}/commit", stale_hold_id),
            Some(("client-a", "client")),
            Some(json!({ "payment_mode": "instant" })),
        )
        .await;
    assert_eq!(commit.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_released_hold_frees_capacity_immediately() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let date = next_monday();
    let hold_res = app.hold_slot(&provider_id, &service_id, "client-a", &date, "10:00").await;
    let hold_id = parse_body(hold_res).await["id"].as_str().unwrap().to_string();

    app.request(
        "DELETE",
        &format!("/api/v1/holds/{}", hold_id),
        Some(("client-a", "client")),
        None,
    )
    .await;

    let retry = app.hold_slot(&provider_id, &service_id, "client-b", &date, "10:00").await;
    assert_eq!(retry.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_preauth_enters_pending_payment() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let date = next_monday();
    let hold_res = app.hold_slot(&provider_id, &service_id, "client-a", &date, "10:00").await;
    let hold_id = parse_body(hold_res).await["id"].as_str().unwrap().to_string();

    let commit_res = app
        .request(
            "POST",
            &format!("/api/v1/holds/{}/commit", hold_id),
            Some(("client-a", "client")),
            Some(json!({ "payment_mode": "preauth" })),
        )
        .await;
    assert_eq!(commit_res.status(), StatusCode::OK);
    let booking = parse_body(commit_res).await;
    assert_eq!(booking["status"], "PENDING_PAYMENT");
    assert_eq!(app.payments.captures.lock().unwrap().len(), 0, "preauth must not capture yet");

    // Payment captured: staff advances to CONFIRMED.
    let advance_res = app
        .request(
            "POST",
            &format!("/api/v1/bookings/{}/advance", booking["id"].as_str().unwrap()),
            Some(("desk-1", "receptionist")),
            Some(json!({ "to": "CONFIRMED" })),
        )
        .await;
    assert_eq!(advance_res.status(), StatusCode::OK);
    assert_eq!(parse_body(advance_res).await["status"], "CONFIRMED");
    assert_eq!(app.payments.captures.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_commit_foreign_hold_forbidden() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let hold_res = app.hold_slot(&provider_id, &service_id, "client-a", &next_monday(), "10:00").await;
    let hold_id = parse_body(hold_res).await["id"].as_str().unwrap().to_string();

    let res = app
        .request(
            "POST",
            &format!("/api/v1/holds/{}/commit", hold_id),
            Some(("client-b", "client")),
            Some(json!({ "payment_mode": "instant" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_misaligned_time_is_not_a_slot() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let service_id = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    // Off-grid time inside the window, and a time outside any window.
    for time in ["10:17", "20:00"] {
        let res = app.hold_slot(&provider_id, &service_id, "client-a", &next_monday(), time).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "time {} must be rejected", time);
    }
}
