use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    Waiting,
    Offered,
    Expired,
    Confirmed,
}

/// FIFO by requested_at, insertion order (rowid) breaking ties.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WaitlistEntry {
    pub id: String,
    pub provider_id: String,
    pub client_id: String,
    pub service_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub status: WaitlistStatus,
    pub offered_start: Option<DateTime<Utc>>,
    pub offered_end: Option<DateTime<Utc>>,
    pub offer_expires_at: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn new(
        provider_id: String,
        client_id: String,
        service_id: String,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            client_id,
            service_id,
            window_start,
            window_end,
            status: WaitlistStatus::Waiting,
            offered_start: None,
            offered_end: None,
            offer_expires_at: None,
            requested_at: Utc::now(),
        }
    }
}
