use chrono::{DateTime, Utc};
use serde::Serialize;

/// Candidate bookable interval derived from availability. Computed, never persisted.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Slot {
    pub provider_id: String,
    pub service_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
