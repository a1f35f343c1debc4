use crate::domain::models::policy::NoShowRecord;
use crate::domain::ports::NoShowRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteNoShowRepo {
    pool: SqlitePool,
}

impl SqliteNoShowRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoShowRepository for SqliteNoShowRepo {
    async fn record(&self, record: &NoShowRecord) -> Result<(), AppError> {
        sqlx::query("INSERT INTO no_show_records (id, client_id, booking_id, occurred_at) VALUES (?, ?, ?, ?)")
            .bind(&record.id).bind(&record.client_id).bind(&record.booking_id).bind(record.occurred_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn count_since(&self, client_id: &str, since: DateTime<Utc>) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM no_show_records WHERE client_id = ? AND occurred_at > ?")
            .bind(client_id).bind(since).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn latest_since(&self, client_id: &str, since: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, AppError> {
        let row = sqlx::query("SELECT MAX(occurred_at) as latest FROM no_show_records WHERE client_id = ? AND occurred_at > ?")
            .bind(client_id).bind(since).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<Option<DateTime<Utc>>, _>("latest"))
    }
}
