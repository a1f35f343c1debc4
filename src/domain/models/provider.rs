use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Provider {
    pub id: String,
    pub display_name: String,
    pub timezone: String,
    pub capabilities: Json<Vec<String>>,
    pub base_capacity: i32,
    pub overbooking_pct: f64,
    pub min_notice_min: i32,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    pub fn new(
        display_name: String,
        timezone: String,
        capabilities: Vec<String>,
        base_capacity: i32,
        overbooking_pct: f64,
        min_notice_min: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name,
            timezone,
            capabilities: Json(capabilities),
            base_capacity,
            overbooking_pct,
            min_notice_min,
            created_at: Utc::now(),
        }
    }

    /// Ceiling of simultaneous occupants per interval, overbooking allowance included.
    pub fn effective_capacity(&self) -> i64 {
        (self.base_capacity as f64 * (1.0 + self.overbooking_pct)).floor() as i64
    }

    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.0.iter().any(|c| c == tag)
    }
}

/// Recurring working window, weekday 0 = Monday, times as provider-local "HH:MM".
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityWindow {
    pub id: String,
    pub provider_id: String,
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn new(provider_id: String, weekday: i32, start_time: String, end_time: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            weekday,
            start_time,
            end_time,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionKind {
    /// Removes time from generation for that date.
    Blocked,
    /// Supplements the recurring windows for that date.
    Added,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityException {
    pub id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityException {
    pub fn new(
        provider_id: String,
        date: NaiveDate,
        kind: ExceptionKind,
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            date,
            kind,
            start_time,
            end_time,
            created_at: Utc::now(),
        }
    }
}
