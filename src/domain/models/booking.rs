use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::hold::SlotHold;

/// Closed status set. Every mutation goes through the lifecycle service;
/// the transition table below is the single authority on legality.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Transient ledger stage, never persisted on a booking row.
    PendingHold,
    PendingPayment,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingHold => "PENDING_HOLD",
            BookingStatus::PendingPayment => "PENDING_PAYMENT",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Whether a booking in this status consumes provider capacity.
    pub fn occupies_capacity(&self) -> bool {
        matches!(
            self,
            BookingStatus::PendingPayment | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }

    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (PendingHold, Confirmed)
                | (PendingHold, PendingPayment)
                | (PendingPayment, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
                | (Confirmed, Cancelled)
                | (InProgress, Cancelled)
                | (Confirmed, NoShow)
                | (InProgress, NoShow)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Pix-style capture at commit; the booking enters directly as CONFIRMED.
    Instant,
    /// Card pre-authorization; the booking passes through PENDING_PAYMENT.
    Preauth,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub provider_id: String,
    pub client_id: String,
    /// One entry for a simple booking, the ordered list for a package.
    pub service_ids: Json<Vec<String>>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub status: BookingStatus,
    pub overbooked: bool,
    pub amount_cents: i64,
    pub payment_auth_id: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancellation_fee_pct: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn from_hold(hold: &SlotHold, status: BookingStatus, payment_auth_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id: hold.provider_id.clone(),
            client_id: hold.client_id.clone(),
            service_ids: hold.service_ids.clone(),
            start_time: hold.start_time,
            end_time: hold.end_time,
            block_start: hold.block_start,
            block_end: hold.block_end,
            status,
            overbooked: hold.overbooked,
            amount_cents: hold.amount_cents,
            payment_auth_id,
            cancelled_by: None,
            cancel_reason: None,
            cancellation_fee_pct: None,
            created_at: Utc::now(),
        }
    }

    /// Consolidates an ordered chain of package holds into one record.
    pub fn from_package_holds(
        holds: &[SlotHold],
        status: BookingStatus,
        payment_auth_id: Option<String>,
    ) -> Self {
        let first = &holds[0];
        let last = &holds[holds.len() - 1];
        let service_ids = holds
            .iter()
            .flat_map(|h| h.service_ids.0.iter().cloned())
            .collect::<Vec<_>>();
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id: first.provider_id.clone(),
            client_id: first.client_id.clone(),
            service_ids: Json(service_ids),
            start_time: first.start_time,
            end_time: last.end_time,
            block_start: first.block_start,
            block_end: last.block_end,
            status,
            overbooked: holds.iter().any(|h| h.overbooked),
            amount_cents: holds.iter().map(|h| h.amount_cents).sum(),
            payment_auth_id,
            cancelled_by: None,
            cancel_reason: None,
            cancellation_fee_pct: None,
            created_at: Utc::now(),
        }
    }
}
