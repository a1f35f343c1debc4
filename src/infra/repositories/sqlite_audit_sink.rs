use crate::domain::models::audit::AuditRecord;
use crate::domain::ports::AuditSink;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(
        &self,
        event_type: &str,
        actor: &str,
        entity_id: &str,
        before: Option<String>,
        after: Option<String>,
    ) -> Result<(), AppError> {
        let record = AuditRecord::new(event_type, actor, entity_id, before, after);
        sqlx::query(
            "INSERT INTO audit_log (id, event_type, actor, entity_id, before_state, after_state, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(&record.id).bind(&record.event_type).bind(&record.actor).bind(&record.entity_id)
            .bind(&record.before_state).bind(&record.after_state).bind(record.recorded_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
