use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub duration_min: i32,
    pub buffer_before_min: i32,
    pub buffer_after_min: i32,
    pub required_capability: String,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl ServiceOffering {
    pub fn new(
        name: String,
        duration_min: i32,
        buffer_before_min: i32,
        buffer_after_min: i32,
        required_capability: String,
        price_cents: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            duration_min,
            buffer_before_min,
            buffer_after_min,
            required_capability,
            price_cents,
            created_at: Utc::now(),
        }
    }
}
