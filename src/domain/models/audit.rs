use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AuditRecord {
    pub id: String,
    pub event_type: String,
    pub actor: String,
    pub entity_id: String,
    pub before_state: Option<String>,
    pub after_state: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        event_type: &str,
        actor: &str,
        entity_id: &str,
        before_state: Option<String>,
        after_state: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            actor: actor.to_string(),
            entity_id: entity_id.to_string(),
            before_state,
            after_state,
            recorded_at: Utc::now(),
        }
    }
}
