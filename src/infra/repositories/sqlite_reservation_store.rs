use crate::domain::models::{booking::Booking, hold::SlotHold};
use crate::domain::ports::ReservationStore;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteReservationStore {
    pool: SqlitePool,
}

impl SqliteReservationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for SqliteReservationStore {
    /// The engine's linearization point. The occupancy count and the insert
    /// are one guarded INSERT..SELECT, which SQLite executes under a single
    /// writer lock: concurrent acquirers serialize here and the guard can
    /// never be evaluated against stale occupancy.
    async fn acquire_hold(
        &self,
        hold: &SlotHold,
        base_capacity: i64,
        effective_capacity: i64,
    ) -> Result<SlotHold, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO holds (id, provider_id, client_id, service_ids, start_time, end_time, block_start, block_end, overbooked, amount_cents, expires_at, created_at)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, occ.n >= ?9, ?10, ?11, ?12
             FROM (
                 SELECT (
                     (SELECT COUNT(*) FROM holds
                        WHERE provider_id = ?2 AND block_start < ?6 AND block_end > ?5 AND expires_at > ?13)
                   + (SELECT COUNT(*) FROM bookings
                        WHERE provider_id = ?2 AND block_start < ?6 AND block_end > ?5
                          AND status IN ('PENDING_PAYMENT', 'CONFIRMED', 'IN_PROGRESS'))
                 ) AS n
             ) AS occ
             WHERE occ.n < ?14"
        )
            .bind(&hold.id)
            .bind(&hold.provider_id)
            .bind(&hold.client_id)
            .bind(&hold.service_ids)
            .bind(hold.start_time)
            .bind(hold.end_time)
            .bind(hold.block_start)
            .bind(hold.block_end)
            .bind(base_capacity)
            .bind(hold.amount_cents)
            .bind(hold.expires_at)
            .bind(hold.created_at)
            .bind(now)
            .bind(effective_capacity)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            // The interval is at its ceiling. Distinguish a hard "fully
            // booked" (overbooking allowance exhausted) from a plain race.
            if effective_capacity > base_capacity {
                return Err(AppError::OverbookingLimitExceeded);
            }
            return Err(AppError::SlotUnavailable);
        }

        sqlx::query_as::<_, SlotHold>("SELECT * FROM holds WHERE id = ?")
            .bind(&hold.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_hold(&self, id: &str) -> Result<Option<SlotHold>, AppError> {
        sqlx::query_as::<_, SlotHold>("SELECT * FROM holds WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn release_hold(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM holds WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit_holds(&self, hold_ids: &[String], booking: &Booking) -> Result<Booking, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        for hold_id in hold_ids {
            let result = sqlx::query("DELETE FROM holds WHERE id = ? AND expires_at > ?")
                .bind(hold_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            if result.rows_affected() == 0 {
                // Hold expired or vanished; the dropped transaction rolls
                // back every delete so no sibling hold is lost.
                return Err(AppError::SlotUnavailable);
            }
        }

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, provider_id, client_id, service_ids, start_time, end_time, block_start, block_end, status, overbooked, amount_cents, payment_auth_id, cancelled_by, cancel_reason, cancellation_fee_pct, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.provider_id).bind(&booking.client_id).bind(&booking.service_ids)
            .bind(booking.start_time).bind(booking.end_time).bind(booking.block_start).bind(booking.block_end)
            .bind(booking.status).bind(booking.overbooked).bind(booking.amount_cents).bind(&booking.payment_auth_id)
            .bind(&booking.cancelled_by).bind(&booking.cancel_reason).bind(booking.cancellation_fee_pct).bind(booking.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn list_active_holds_in_range(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotHold>, AppError> {
        sqlx::query_as::<_, SlotHold>(
            "SELECT * FROM holds WHERE provider_id = ? AND block_start < ? AND block_end > ? AND expires_at > ?"
        )
            .bind(provider_id).bind(end).bind(start).bind(now)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn purge_expired_holds(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM holds WHERE expires_at <= ?").bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
