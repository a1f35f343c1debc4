use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::booking::{Booking, BookingStatus, PaymentMode};
use crate::domain::models::hold::SlotHold;
use crate::domain::models::provider::Provider;
use crate::domain::models::service::ServiceOffering;
use crate::domain::ports::{AuditSink, NotificationDispatcher, PaymentGateway, ReservationStore};
use crate::domain::services::policy::PolicyService;
use crate::error::AppError;

const ACQUIRE_RETRY_ATTEMPTS: u32 = 3;

/// The reservation engine: turns a candidate slot into a durable booking via
/// the two-phase hold/commit protocol. Capacity truth lives in the store's
/// atomic count-and-insert; everything else routes through here.
pub struct ReservationLedger {
    store: Arc<dyn ReservationStore>,
    policy: Arc<PolicyService>,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditSink>,
    hold_ttl: Duration,
}

impl ReservationLedger {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        policy: Arc<PolicyService>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationDispatcher>,
        audit: Arc<dyn AuditSink>,
        hold_ttl_secs: i64,
    ) -> Self {
        Self {
            store,
            policy,
            payments,
            notifier,
            audit,
            hold_ttl: Duration::seconds(hold_ttl_secs),
        }
    }

    /// Phase one: atomically claim capacity for `[start, start+duration)`.
    /// Store contention is retried with jittered backoff and never surfaced;
    /// capacity refusals come back as SlotUnavailable / OverbookingLimitExceeded.
    pub async fn hold(
        &self,
        provider: &Provider,
        service: &ServiceOffering,
        start: DateTime<Utc>,
        client_id: &str,
    ) -> Result<SlotHold, AppError> {
        if !provider.has_capability(&service.required_capability) {
            return Err(AppError::Validation(format!(
                "Provider lacks capability '{}'",
                service.required_capability
            )));
        }

        if let Some(block) = self.policy.block_status(client_id, Utc::now()).await? {
            return Err(AppError::ClientBlocked { until: block.active_until });
        }

        let hold = SlotHold::new(
            provider.id.clone(),
            client_id.to_string(),
            service,
            start,
            self.hold_ttl,
        );
        let base = provider.base_capacity as i64;
        let effective = provider.effective_capacity();

        let mut attempt = 0;
        let acquired = loop {
            match self.store.acquire_hold(&hold, base, effective).await {
                Err(AppError::Database(e)) if is_busy(&e) && attempt < ACQUIRE_RETRY_ATTEMPTS => {
                    attempt += 1;
                    let jitter = rand::thread_rng().gen_range(0..25);
                    warn!("Hold acquisition contended, retry {}/{}", attempt, ACQUIRE_RETRY_ATTEMPTS);
                    tokio::time::sleep(std::time::Duration::from_millis(20 * attempt as u64 + jitter)).await;
                }
                other => break other?,
            }
        };

        info!(
            "Hold acquired: {} for provider {} [{} - {}] (overbooked: {})",
            acquired.id, acquired.provider_id, acquired.start_time, acquired.end_time, acquired.overbooked
        );
        self.audit
            .record(
                "hold_acquired",
                client_id,
                &acquired.id,
                None,
                Some(json!({ "start": acquired.start_time, "end": acquired.end_time }).to_string()),
            )
            .await?;

        Ok(acquired)
    }

    /// Phase two: converts an unexpired hold into a persisted booking.
    /// An expired or missing hold fails SlotUnavailable; the caller should
    /// re-query the slot generator.
    pub async fn commit(
        &self,
        hold_id: &str,
        mode: PaymentMode,
        actor: &str,
    ) -> Result<Booking, AppError> {
        let now = Utc::now();
        let hold = self
            .store
            .find_hold(hold_id)
            .await?
            .ok_or(AppError::SlotUnavailable)?;
        if hold.is_expired(now) {
            self.store.release_hold(hold_id).await?;
            return Err(AppError::SlotUnavailable);
        }
        self.commit_internal(vec![hold], mode, actor).await
    }

    /// Commits an ordered chain of package holds as one booking record.
    pub async fn commit_package(
        &self,
        holds: Vec<SlotHold>,
        mode: PaymentMode,
        actor: &str,
    ) -> Result<Booking, AppError> {
        self.commit_internal(holds, mode, actor).await
    }

    async fn commit_internal(
        &self,
        holds: Vec<SlotHold>,
        mode: PaymentMode,
        actor: &str,
    ) -> Result<Booking, AppError> {
        let amount: i64 = holds.iter().map(|h| h.amount_cents).sum();
        let client_id = holds[0].client_id.clone();

        let auth_id = if amount > 0 {
            let auth = self.payments.authorize(&client_id, amount).await?;
            if mode == PaymentMode::Instant {
                self.payments.capture(&auth).await?;
            }
            Some(auth)
        } else {
            None
        };

        let status = match mode {
            PaymentMode::Instant => BookingStatus::Confirmed,
            PaymentMode::Preauth => BookingStatus::PendingPayment,
        };

        let booking = if holds.len() == 1 {
            Booking::from_hold(&holds[0], status, auth_id.clone())
        } else {
            Booking::from_package_holds(&holds, status, auth_id.clone())
        };

        let hold_ids: Vec<String> = holds.iter().map(|h| h.id.clone()).collect();
        let committed = match self.store.commit_holds(&hold_ids, &booking).await {
            Ok(b) => b,
            Err(e) => {
                // The hold vanished mid-commit; give the money back.
                if let Some(auth) = &auth_id {
                    if let Err(refund_err) = self.payments.refund(auth, amount).await {
                        warn!("Refund after failed commit also failed: {:?}", refund_err);
                    }
                }
                return Err(e);
            }
        };

        info!("Booking committed: {} ({})", committed.id, committed.status.as_str());
        self.audit
            .record(
                "booking_committed",
                actor,
                &committed.id,
                Some(BookingStatus::PendingHold.as_str().to_string()),
                Some(committed.status.as_str().to_string()),
            )
            .await?;

        if committed.status == BookingStatus::Confirmed {
            self.notifier
                .notify(
                    "booking_confirmed",
                    &committed.client_id,
                    json!({
                        "booking_id": committed.id,
                        "provider_id": committed.provider_id,
                        "start": committed.start_time,
                        "end": committed.end_time,
                    }),
                )
                .await;
        }

        Ok(committed)
    }

    /// Idempotent; releasing an already-expired or committed hold is a no-op.
    pub async fn release(&self, hold_id: &str, actor: &str) -> Result<(), AppError> {
        if self.store.release_hold(hold_id).await? {
            info!("Hold released: {}", hold_id);
            self.audit.record("hold_released", actor, hold_id, None, None).await?;
        }
        Ok(())
    }
}

fn is_busy(e: &sqlx::Error) -> bool {
    match e.as_database_error() {
        Some(db_err) => {
            // 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED
            let code = db_err.code().unwrap_or_default();
            code == "5" || code == "6" || db_err.message().contains("database is locked")
        }
        None => false,
    }
}
