use crate::domain::models::provider::{AvailabilityException, AvailabilityWindow, Provider};
use crate::domain::ports::ProviderRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteProviderRepo {
    pool: SqlitePool,
}

impl SqliteProviderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderRepository for SqliteProviderRepo {
    async fn create(&self, provider: &Provider) -> Result<Provider, AppError> {
        sqlx::query_as::<_, Provider>(
            "INSERT INTO providers (id, display_name, timezone, capabilities, base_capacity, overbooking_pct, min_notice_min, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&provider.id).bind(&provider.display_name).bind(&provider.timezone).bind(&provider.capabilities)
            .bind(provider.base_capacity).bind(provider.overbooking_pct).bind(provider.min_notice_min).bind(provider.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Provider>, AppError> {
        sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_window(&self, window: &AvailabilityWindow) -> Result<AvailabilityWindow, AppError> {
        sqlx::query_as::<_, AvailabilityWindow>(
            "INSERT INTO availability_windows (id, provider_id, weekday, start_time, end_time, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&window.id).bind(&window.provider_id).bind(window.weekday)
            .bind(&window.start_time).bind(&window.end_time).bind(window.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_windows(&self, provider_id: &str) -> Result<Vec<AvailabilityWindow>, AppError> {
        sqlx::query_as::<_, AvailabilityWindow>("SELECT * FROM availability_windows WHERE provider_id = ? ORDER BY weekday, start_time")
            .bind(provider_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_windows_for_day(&self, provider_id: &str, weekday: i32) -> Result<Vec<AvailabilityWindow>, AppError> {
        sqlx::query_as::<_, AvailabilityWindow>("SELECT * FROM availability_windows WHERE provider_id = ? AND weekday = ? ORDER BY start_time")
            .bind(provider_id).bind(weekday).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_window(&self, provider_id: &str, window_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_windows WHERE id = ? AND provider_id = ?")
            .bind(window_id).bind(provider_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability window not found".into()));
        }
        Ok(())
    }

    async fn upsert_exception(&self, exception: &AvailabilityException) -> Result<AvailabilityException, AppError> {
        sqlx::query_as::<_, AvailabilityException>(
            "INSERT INTO availability_exceptions (id, provider_id, date, kind, start_time, end_time, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(provider_id, date, kind, start_time) DO UPDATE SET end_time = excluded.end_time
             RETURNING *"
        )
            .bind(&exception.id).bind(&exception.provider_id).bind(exception.date).bind(exception.kind)
            .bind(&exception.start_time).bind(&exception.end_time).bind(exception.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_exceptions_for_date(&self, provider_id: &str, date: NaiveDate) -> Result<Vec<AvailabilityException>, AppError> {
        sqlx::query_as::<_, AvailabilityException>("SELECT * FROM availability_exceptions WHERE provider_id = ? AND date = ?")
            .bind(provider_id).bind(date).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_exception(&self, provider_id: &str, exception_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_exceptions WHERE id = ? AND provider_id = ?")
            .bind(exception_id).bind(provider_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability exception not found".into()));
        }
        Ok(())
    }
}
