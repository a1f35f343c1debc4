use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE provider_id = ? ORDER BY start_time ASC")
            .bind(provider_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE client_id = ? ORDER BY start_time ASC")
            .bind(client_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_occupying_in_range(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE provider_id = ? AND block_start < ? AND block_end > ?
             AND status IN ('PENDING_PAYMENT', 'CONFIRMED', 'IN_PROGRESS')"
        )
            .bind(provider_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_guarded(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
    ) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ?, cancelled_by = ?, cancel_reason = ?, cancellation_fee_pct = ?, payment_auth_id = ?
             WHERE id = ? AND status = ?
             RETURNING *"
        )
            .bind(booking.status).bind(&booking.cancelled_by).bind(&booking.cancel_reason)
            .bind(booking.cancellation_fee_pct).bind(&booking.payment_auth_id)
            .bind(&booking.id).bind(expected_status)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::Conflict("Booking was modified concurrently".into()))
    }
}
