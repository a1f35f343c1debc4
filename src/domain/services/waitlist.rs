use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::domain::models::booking::{Booking, PaymentMode};
use crate::domain::models::waitlist::{WaitlistEntry, WaitlistStatus};
use crate::domain::ports::{
    AuditSink, NotificationDispatcher, ProviderRepository, ServiceRepository, WaitlistRepository,
};
use crate::domain::services::ledger::ReservationLedger;
use crate::error::AppError;

/// FIFO queue per provider with race-safe promotion. The waitlist never
/// grants capacity itself, only priority to attempt the ledger's hold/commit.
pub struct WaitlistService {
    entries: Arc<dyn WaitlistRepository>,
    providers: Arc<dyn ProviderRepository>,
    services: Arc<dyn ServiceRepository>,
    ledger: Arc<ReservationLedger>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditSink>,
    offer_ttl: Duration,
}

impl WaitlistService {
    pub fn new(
        entries: Arc<dyn WaitlistRepository>,
        providers: Arc<dyn ProviderRepository>,
        services: Arc<dyn ServiceRepository>,
        ledger: Arc<ReservationLedger>,
        notifier: Arc<dyn NotificationDispatcher>,
        audit: Arc<dyn AuditSink>,
        offer_ttl_secs: i64,
    ) -> Self {
        Self {
            entries,
            providers,
            services,
            ledger,
            notifier,
            audit,
            offer_ttl: Duration::seconds(offer_ttl_secs),
        }
    }

    pub async fn join(
        &self,
        provider_id: &str,
        service_id: &str,
        client_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<WaitlistEntry, AppError> {
        if window_start >= window_end {
            return Err(AppError::Validation("Desired window start must be before end".into()));
        }
        self.providers
            .find_by_id(provider_id)
            .await?
            .ok_or(AppError::NotFound("Provider not found".into()))?;
        self.services
            .find_by_id(service_id)
            .await?
            .ok_or(AppError::NotFound("Service not found".into()))?;

        let entry = WaitlistEntry::new(
            provider_id.to_string(),
            client_id.to_string(),
            service_id.to_string(),
            window_start,
            window_end,
        );
        let created = self.entries.create(&entry).await?;
        info!("Waitlist joined: {} for provider {}", created.id, provider_id);
        Ok(created)
    }

    /// Invoked whenever a booking leaves an active state and frees capacity.
    /// Offers the released interval to the oldest intersecting WAITING entry
    /// only; losing the guarded update means another promoter got there first,
    /// in which case the next entry in line is tried.
    pub async fn on_release(
        &self,
        provider_id: &str,
        released_start: DateTime<Utc>,
        released_end: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        while let Some(entry) = self
            .entries
            .oldest_waiting_intersecting(provider_id, released_start, released_end)
            .await?
        {
            let service = self
                .services
                .find_by_id(&entry.service_id)
                .await?
                .ok_or_else(|| AppError::InternalWithMsg(format!("Service {} missing", entry.service_id)))?;

            let offered_start = released_start;
            let offered_end = offered_start + Duration::minutes(service.duration_min as i64);
            let expires_at = now + self.offer_ttl;

            if self
                .entries
                .mark_offered(&entry.id, offered_start, offered_end, expires_at)
                .await?
            {
                info!("Waitlist offer: entry {} gets [{} - {}]", entry.id, offered_start, offered_end);
                self.audit
                    .record(
                        "waitlist_offered",
                        "waitlist",
                        &entry.id,
                        Some("WAITING".to_string()),
                        Some("OFFERED".to_string()),
                    )
                    .await?;
                self.notifier
                    .notify(
                        "waitlist_offer",
                        &entry.client_id,
                        json!({
                            "entry_id": entry.id,
                            "offered_start": offered_start,
                            "offered_end": offered_end,
                            "expires_at": expires_at,
                        }),
                    )
                    .await;
                break;
            }
        }
        Ok(())
    }

    /// Routes through the ledger's hold/commit exactly like a direct booking;
    /// the guarded status flip keeps concurrent confirmations to one winner.
    pub async fn confirm_offer(&self, entry_id: &str, client_id: &str) -> Result<Booking, AppError> {
        let now = Utc::now();
        let entry = self
            .entries
            .find_by_id(entry_id)
            .await?
            .ok_or(AppError::NotFound("Waitlist entry not found".into()))?;

        if entry.client_id != client_id {
            return Err(AppError::Forbidden("Offer belongs to another client".into()));
        }
        match entry.status {
            WaitlistStatus::Offered => {}
            WaitlistStatus::Expired => return Err(AppError::WaitlistOfferExpired),
            WaitlistStatus::Waiting => return Err(AppError::Conflict("No active offer for this entry".into())),
            WaitlistStatus::Confirmed => return Err(AppError::Conflict("Offer already confirmed".into())),
        }

        let offer_expires_at = entry.offer_expires_at.ok_or(AppError::Internal)?;
        if offer_expires_at <= now {
            self.expire_and_cascade(&entry).await?;
            return Err(AppError::WaitlistOfferExpired);
        }

        let offered_start = entry.offered_start.ok_or(AppError::Internal)?;
        let provider = self
            .providers
            .find_by_id(&entry.provider_id)
            .await?
            .ok_or(AppError::NotFound("Provider not found".into()))?;
        let service = self
            .services
            .find_by_id(&entry.service_id)
            .await?
            .ok_or(AppError::NotFound("Service not found".into()))?;

        let hold = self.ledger.hold(&provider, &service, offered_start, client_id).await?;

        if !self.entries.mark_confirmed(&entry.id).await? {
            self.ledger.release(&hold.id, client_id).await?;
            return Err(AppError::Conflict("Offer already confirmed".into()));
        }

        match self.ledger.commit(&hold.id, PaymentMode::Instant, client_id).await {
            Ok(booking) => {
                self.audit
                    .record(
                        "waitlist_confirmed",
                        client_id,
                        &entry.id,
                        Some("OFFERED".to_string()),
                        Some("CONFIRMED".to_string()),
                    )
                    .await?;
                Ok(booking)
            }
            Err(e) => {
                let _ = self.ledger.release(&hold.id, client_id).await;
                let _ = self.entries.reopen_offer(&entry.id).await;
                Err(e)
            }
        }
    }

    /// Early reclaim: the offer cascades to the next FIFO entry immediately
    /// instead of waiting out the TTL.
    pub async fn cancel_offer(&self, entry_id: &str) -> Result<(), AppError> {
        let entry = self
            .entries
            .find_by_id(entry_id)
            .await?
            .ok_or(AppError::NotFound("Waitlist entry not found".into()))?;
        if entry.status != WaitlistStatus::Offered {
            return Err(AppError::Conflict("Entry has no active offer".into()));
        }
        self.expire_and_cascade(&entry).await
    }

    /// Sweeper entry point: expires stale offers and cascades each released
    /// interval to the next entry in line.
    pub async fn sweep_expired_offers(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let stale = self.entries.find_expired_offers(now).await?;
        let mut swept = 0;
        for entry in stale {
            self.expire_and_cascade(&entry).await?;
            swept += 1;
        }
        Ok(swept)
    }

    async fn expire_and_cascade(&self, entry: &WaitlistEntry) -> Result<(), AppError> {
        if self.entries.mark_expired(&entry.id).await? {
            info!("Waitlist offer expired: {}", entry.id);
            self.audit
                .record(
                    "waitlist_offer_expired",
                    "waitlist",
                    &entry.id,
                    Some("OFFERED".to_string()),
                    Some("EXPIRED".to_string()),
                )
                .await?;
            if let (Some(start), Some(end)) = (entry.offered_start, entry.offered_end) {
                self.on_release(&entry.provider_id, start, end).await?;
            }
        }
        Ok(())
    }

    pub async fn get(&self, entry_id: &str) -> Result<Option<WaitlistEntry>, AppError> {
        self.entries.find_by_id(entry_id).await
    }

    pub async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<WaitlistEntry>, AppError> {
        self.entries.list_by_provider(provider_id).await
    }
}
