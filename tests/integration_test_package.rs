mod common;

use axum::http::StatusCode;
use common::{next_monday, parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_package_reserves_consecutive_services() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let cut = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    let color = app.create_service("Color", 30, 0, 0, "hair", 9000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/providers/{}/packages", provider_id),
            Some(("client-a", "client")),
            Some(json!({
                "service_ids": [cut, color],
                "date": next_monday(),
                "time": "09:00",
                "payment_mode": "instant",
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let booking = parse_body(res).await;

    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["service_ids"].as_array().unwrap().len(), 2);
    assert!(booking["start_time"].as_str().unwrap().contains("T09:00:00"));
    assert!(booking["end_time"].as_str().unwrap().contains("T10:30:00"));
    assert_eq!(booking["amount_cents"], 14000);

    // One consolidated authorization, not one per sub-slot.
    let auths = app.payments.authorizations.lock().unwrap();
    assert_eq!(auths.len(), 1);
    assert_eq!(auths[0].1, 14000);
}

#[tokio::test]
async fn test_package_chains_through_trailing_buffer() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let cut = app.create_service("Cut", 60, 0, 15, "hair", 5000).await;
    let color = app.create_service("Color", 30, 0, 0, "hair", 9000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/providers/{}/packages", provider_id),
            Some(("client-a", "client")),
            Some(json!({
                "service_ids": [cut, color],
                "date": next_monday(),
                "time": "09:00",
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let booking = parse_body(res).await;

    // Color starts after the cut's 15-minute cleanup buffer.
    assert!(booking["end_time"].as_str().unwrap().contains("T10:45:00"));
}

#[tokio::test]
async fn test_package_rolls_back_on_partial_failure() {
    let app = TestApp::new().await;
    let provider_id = app.create_provider(&["hair"], 1, 0.0).await;
    let cut = app.create_service("Cut", 60, 0, 0, "hair", 5000).await;
    let color = app.create_service("Color", 30, 0, 0, "hair", 9000).await;
    app.add_window(&provider_id, 0, "09:00", "12:00").await;

    let date = next_monday();
    // Occupies 10:00-11:00, colliding with the package's second sub-slot.
    app.book_slot(&provider_id, &cut, "client-x", &date, "10:00").await;

    let res = app
        .request(
            "POST",
            &format!("/api/v1/providers/{}/packages", provider_id),
            Some(("client-a", "client")),
            Some(json!({
                "service_ids": [cut, color],
                "date": date,
                "time": "09:00",
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert_eq!(body["code"], "PACKAGE_PARTIAL_FAILURE");
    assert_eq!(body["failed_index"], 1);

    // No partial booking was persisted for the client.
    let bookings = app
        .request(
            "GET",
            &format!("/api/v1/providers/{}/bookings", provider_id),
            Some(("desk-1", "receptionist")),
            None,
        )
        .await;
    let bookings = parse_body(bookings).await;
    let client_a_rows: Vec<_> = bookings
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["client_id"] == "client-a")
        .collect();
    assert!(client_a_rows.is_empty(), "partial package must not persist");

    // The first sub-hold was released: 09:00 is immediately bookable.
    let res = app.hold_slot(&provider_id, &cut, "client-b", &date, "09:00").await;
    assert_eq!(res.status(), StatusCode::OK);

    // Nothing was charged for the failed attempt.
    assert_eq!(app.payments.authorizations.lock().unwrap().len(), 1);
}
