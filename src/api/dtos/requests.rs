use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::booking::{BookingStatus, PaymentMode};
use crate::domain::models::provider::ExceptionKind;

#[derive(Deserialize)]
pub struct CreateProviderRequest {
    pub display_name: String,
    pub timezone: String,
    pub capabilities: Vec<String>,
    pub base_capacity: Option<i32>,
    pub overbooking_pct: Option<f64>,
    pub min_notice_min: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreateWindowRequest {
    pub weekday: i32,
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct UpsertExceptionRequest {
    pub date: String,
    pub kind: ExceptionKind,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_min: i32,
    pub buffer_before_min: Option<i32>,
    pub buffer_after_min: Option<i32>,
    pub required_capability: String,
    pub price_cents: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateHoldRequest {
    pub service_id: String,
    pub date: String,
    pub time: String,
}

#[derive(Deserialize)]
pub struct CommitHoldRequest {
    pub payment_mode: Option<PaymentMode>,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct AdvanceStatusRequest {
    pub to: BookingStatus,
}

#[derive(Deserialize)]
pub struct JoinWaitlistRequest {
    pub service_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ReservePackageRequest {
    pub service_ids: Vec<String>,
    pub date: String,
    pub time: String,
    pub payment_mode: Option<PaymentMode>,
}

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub service: String,
    pub date: String,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}
