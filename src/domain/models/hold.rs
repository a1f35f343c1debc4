use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::service::ServiceOffering;

/// Tentative capacity reservation bridging client checkout latency.
///
/// `block_start`/`block_end` is the interval occupancy accounting sees: the
/// client-visible range padded with the service buffers. An expired hold never
/// counts toward occupancy; the sweeper garbage-collects the row.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SlotHold {
    pub id: String,
    pub provider_id: String,
    pub client_id: String,
    pub service_ids: Json<Vec<String>>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub overbooked: bool,
    pub amount_cents: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SlotHold {
    pub fn new(
        provider_id: String,
        client_id: String,
        service: &ServiceOffering,
        start: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let end = start + Duration::minutes(service.duration_min as i64);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            client_id,
            service_ids: Json(vec![service.id.clone()]),
            start_time: start,
            end_time: end,
            block_start: start - Duration::minutes(service.buffer_before_min as i64),
            block_end: end + Duration::minutes(service.buffer_after_min as i64),
            overbooked: false,
            amount_cents: service.price_cents,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
