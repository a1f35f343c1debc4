use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::ports::{AuditSink, BookingRepository, NotificationDispatcher, PaymentGateway};
use crate::domain::services::policy::PolicyService;
use crate::domain::services::waitlist::WaitlistService;
use crate::error::AppError;

/// The single mutation point for booking status. Every transition is checked
/// against the table on `BookingStatus`, applied with a status-guarded write,
/// and logged to the audit sink.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
    policy: Arc<PolicyService>,
    payments: Arc<dyn PaymentGateway>,
    waitlist: Arc<WaitlistService>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditSink>,
}

impl BookingLifecycle {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        policy: Arc<PolicyService>,
        payments: Arc<dyn PaymentGateway>,
        waitlist: Arc<WaitlistService>,
        notifier: Arc<dyn NotificationDispatcher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { bookings, policy, payments, waitlist, notifier, audit }
    }

    /// Forward progression: PENDING_PAYMENT -> CONFIRMED (captures the
    /// pre-authorization), CONFIRMED -> IN_PROGRESS, IN_PROGRESS -> COMPLETED.
    /// Cancellation and no-show have their own entry points below.
    pub async fn advance(
        &self,
        booking_id: &str,
        to: BookingStatus,
        actor: &str,
    ) -> Result<Booking, AppError> {
        if matches!(to, BookingStatus::Cancelled | BookingStatus::NoShow) {
            return Err(AppError::Validation(
                "Cancellation and no-show go through their dedicated operations".into(),
            ));
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let from = booking.status;
        if !from.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        if from == BookingStatus::PendingPayment && to == BookingStatus::Confirmed {
            let auth = booking
                .payment_auth_id
                .as_deref()
                .ok_or(AppError::InternalWithMsg("Pending booking without authorization".into()))?;
            self.payments.capture(auth).await?;
        }

        let mut updated = booking.clone();
        updated.status = to;
        let saved = self.bookings.update_guarded(&updated, from).await?;

        self.record_transition(&saved, from, actor).await?;

        if to == BookingStatus::Confirmed {
            self.notifier
                .notify(
                    "booking_confirmed",
                    &saved.client_id,
                    json!({ "booking_id": saved.id, "start": saved.start_time }),
                )
                .await;
        }

        Ok(saved)
    }

    /// Applies the fee tier for the remaining lead time, refunds the
    /// remainder, and hands the freed interval to the waitlist.
    pub async fn cancel(
        &self,
        booking_id: &str,
        actor: &str,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let from = booking.status;
        if from.is_terminal() {
            return Err(AppError::PolicyViolation("Booking is already terminal".into()));
        }
        if !from.can_transition_to(BookingStatus::Cancelled) {
            return Err(AppError::InvalidTransition {
                from: from.as_str().to_string(),
                to: BookingStatus::Cancelled.as_str().to_string(),
            });
        }

        let now = Utc::now();
        let fee_pct = self.policy.compute_fee(&booking, now);
        self.audit
            .record(
                "cancellation_fee_applied",
                actor,
                &booking.id,
                None,
                Some(json!({ "fee_pct": fee_pct, "lead_minutes": (booking.start_time - now).num_minutes() }).to_string()),
            )
            .await?;

        let mut updated = booking.clone();
        updated.status = BookingStatus::Cancelled;
        updated.cancelled_by = Some(actor.to_string());
        updated.cancel_reason = reason;
        updated.cancellation_fee_pct = Some(fee_pct as i32);
        let saved = self.bookings.update_guarded(&updated, from).await?;

        info!("Booking cancelled: {} (fee {}%)", saved.id, fee_pct);

        if let Some(auth) = &saved.payment_auth_id {
            let refund_cents = saved.amount_cents * (100 - fee_pct as i64) / 100;
            if refund_cents > 0 {
                // The booking is already terminal; a refund failure is retried
                // out of band, not rolled into the cancellation result.
                if let Err(e) = self.payments.refund(auth, refund_cents).await {
                    warn!("Refund of {} cents for booking {} failed: {:?}", refund_cents, saved.id, e);
                }
            }
        }

        self.record_transition(&saved, from, actor).await?;
        self.notifier
            .notify(
                "booking_cancelled",
                &saved.client_id,
                json!({ "booking_id": saved.id, "fee_pct": fee_pct }),
            )
            .await;

        self.waitlist
            .on_release(&saved.provider_id, saved.start_time, saved.end_time)
            .await?;

        Ok(saved)
    }

    /// Marks the no-show, feeds the policy engine's rolling window, and
    /// releases the interval to the waitlist.
    pub async fn mark_no_show(&self, booking_id: &str, actor: &str) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let from = booking.status;
        if !from.can_transition_to(BookingStatus::NoShow) {
            return Err(AppError::InvalidTransition {
                from: from.as_str().to_string(),
                to: BookingStatus::NoShow.as_str().to_string(),
            });
        }

        let mut updated = booking.clone();
        updated.status = BookingStatus::NoShow;
        let saved = self.bookings.update_guarded(&updated, from).await?;

        self.policy.record_no_show(&saved.client_id, &saved.id, Utc::now()).await?;
        self.record_transition(&saved, from, actor).await?;

        self.waitlist
            .on_release(&saved.provider_id, saved.start_time, saved.end_time)
            .await?;

        Ok(saved)
    }

    async fn record_transition(
        &self,
        booking: &Booking,
        from: BookingStatus,
        actor: &str,
    ) -> Result<(), AppError> {
        self.audit
            .record(
                "booking_transition",
                actor,
                &booking.id,
                Some(from.as_str().to_string()),
                Some(booking.status.as_str().to_string()),
            )
            .await
    }
}
