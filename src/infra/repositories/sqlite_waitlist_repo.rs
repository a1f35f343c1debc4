use crate::domain::models::waitlist::WaitlistEntry;
use crate::domain::ports::WaitlistRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteWaitlistRepo {
    pool: SqlitePool,
}

impl SqliteWaitlistRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistRepository for SqliteWaitlistRepo {
    async fn create(&self, entry: &WaitlistEntry) -> Result<WaitlistEntry, AppError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO waitlist_entries (id, provider_id, client_id, service_id, window_start, window_end, status, offered_start, offered_end, offer_expires_at, requested_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&entry.id).bind(&entry.provider_id).bind(&entry.client_id).bind(&entry.service_id)
            .bind(entry.window_start).bind(entry.window_end).bind(entry.status)
            .bind(entry.offered_start).bind(entry.offered_end).bind(entry.offer_expires_at).bind(entry.requested_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM waitlist_entries WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM waitlist_entries WHERE provider_id = ? ORDER BY requested_at ASC, rowid ASC")
            .bind(provider_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn oldest_waiting_intersecting(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlist_entries
             WHERE provider_id = ? AND status = 'WAITING' AND window_start < ? AND window_end > ?
             ORDER BY requested_at ASC, rowid ASC
             LIMIT 1"
        )
            .bind(provider_id).bind(end).bind(start)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_offered(
        &self,
        id: &str,
        offered_start: DateTime<Utc>,
        offered_end: DateTime<Utc>,
        offer_expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE waitlist_entries SET status = 'OFFERED', offered_start = ?, offered_end = ?, offer_expires_at = ?
             WHERE id = ? AND status = 'WAITING'"
        )
            .bind(offered_start).bind(offered_end).bind(offer_expires_at).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_confirmed(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE waitlist_entries SET status = 'CONFIRMED' WHERE id = ? AND status = 'OFFERED'")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_expired(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE waitlist_entries SET status = 'EXPIRED' WHERE id = ? AND status = 'OFFERED'")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn reopen_offer(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE waitlist_entries SET status = 'OFFERED' WHERE id = ? AND status = 'CONFIRMED'")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_expired_offers(&self, now: DateTime<Utc>) -> Result<Vec<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlist_entries WHERE status = 'OFFERED' AND offer_expires_at <= ? ORDER BY offer_expires_at ASC"
        )
            .bind(now).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
