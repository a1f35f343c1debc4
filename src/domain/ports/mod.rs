use crate::domain::models::{
    booking::{Booking, BookingStatus},
    hold::SlotHold,
    policy::NoShowRecord,
    provider::{AvailabilityException, AvailabilityWindow, Provider},
    service::ServiceOffering,
    waitlist::WaitlistEntry,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn create(&self, provider: &Provider) -> Result<Provider, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Provider>, AppError>;
    async fn create_window(&self, window: &AvailabilityWindow) -> Result<AvailabilityWindow, AppError>;
    async fn list_windows(&self, provider_id: &str) -> Result<Vec<AvailabilityWindow>, AppError>;
    async fn list_windows_for_day(&self, provider_id: &str, weekday: i32) -> Result<Vec<AvailabilityWindow>, AppError>;
    async fn delete_window(&self, provider_id: &str, window_id: &str) -> Result<(), AppError>;
    async fn upsert_exception(&self, exception: &AvailabilityException) -> Result<AvailabilityException, AppError>;
    async fn list_exceptions_for_date(&self, provider_id: &str, date: NaiveDate) -> Result<Vec<AvailabilityException>, AppError>;
    async fn delete_exception(&self, provider_id: &str, exception_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &ServiceOffering) -> Result<ServiceOffering, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ServiceOffering>, AppError>;
    async fn list(&self) -> Result<Vec<ServiceOffering>, AppError>;
}

/// Owns the holds table and the hold -> booking conversion. `acquire` is the
/// engine's only linearization point: the occupancy check and the insert run
/// in one immediate transaction, so concurrent callers serialize on the store.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Checks occupancy over the hold's buffered range and inserts the hold
    /// atomically. Fails SlotUnavailable / OverbookingLimitExceeded when the
    /// interval is at capacity; sets the overbooked flag when the hold lands
    /// above base capacity.
    async fn acquire_hold(
        &self,
        hold: &SlotHold,
        base_capacity: i64,
        effective_capacity: i64,
    ) -> Result<SlotHold, AppError>;
    async fn find_hold(&self, id: &str) -> Result<Option<SlotHold>, AppError>;
    /// Idempotent. Returns whether a row was actually deleted.
    async fn release_hold(&self, id: &str) -> Result<bool, AppError>;
    /// Deletes every unexpired hold in `hold_ids` and inserts the booking in
    /// one transaction. Fails SlotUnavailable if any hold is gone or expired.
    async fn commit_holds(&self, hold_ids: &[String], booking: &Booking) -> Result<Booking, AppError>;
    async fn list_active_holds_in_range(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotHold>, AppError>;
    async fn purge_expired_holds(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Capacity-occupying bookings whose buffered range overlaps [start, end).
    async fn list_occupying_in_range(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError>;
    /// Guarded write: persists `booking` only while the stored row still has
    /// `expected_status`, so racing transitions cannot double-apply.
    async fn update_guarded(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
    ) -> Result<Booking, AppError>;
}

#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    async fn create(&self, entry: &WaitlistEntry) -> Result<WaitlistEntry, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<WaitlistEntry>, AppError>;
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<WaitlistEntry>, AppError>;
    /// Oldest WAITING entry whose desired window intersects [start, end).
    async fn oldest_waiting_intersecting(
        &self,
        provider_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<WaitlistEntry>, AppError>;
    /// WAITING -> OFFERED, guarded on the current status. False on a lost race.
    async fn mark_offered(
        &self,
        id: &str,
        offered_start: DateTime<Utc>,
        offered_end: DateTime<Utc>,
        offer_expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
    /// OFFERED -> CONFIRMED, guarded. False on a lost race.
    async fn mark_confirmed(&self, id: &str) -> Result<bool, AppError>;
    /// OFFERED -> EXPIRED, guarded. False on a lost race.
    async fn mark_expired(&self, id: &str) -> Result<bool, AppError>;
    /// CONFIRMED -> OFFERED rollback after a failed confirmation attempt.
    async fn reopen_offer(&self, id: &str) -> Result<bool, AppError>;
    async fn find_expired_offers(&self, now: DateTime<Utc>) -> Result<Vec<WaitlistEntry>, AppError>;
}

#[async_trait]
pub trait NoShowRepository: Send + Sync {
    async fn record(&self, record: &NoShowRecord) -> Result<(), AppError>;
    async fn count_since(&self, client_id: &str, since: DateTime<Utc>) -> Result<i64, AppError>;
    async fn latest_since(&self, client_id: &str, since: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, AppError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, client_id: &str, amount_cents: i64) -> Result<String, AppError>;
    async fn capture(&self, auth_id: &str) -> Result<(), AppError>;
    async fn refund(&self, auth_id: &str, amount_cents: i64) -> Result<(), AppError>;
}

/// At-least-once, fire-and-forget. Implementations must return without
/// waiting on delivery; callers never treat a dispatch failure as an error.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, event_type: &str, recipient: &str, payload: serde_json::Value);
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        event_type: &str,
        actor: &str,
        entity_id: &str,
        before: Option<String>,
        after: Option<String>,
    ) -> Result<(), AppError>;
}
