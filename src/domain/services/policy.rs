use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::domain::models::booking::Booking;
use crate::domain::models::policy::{BlockStatus, CancellationPolicy, NoShowRecord};
use crate::domain::ports::{AuditSink, NoShowRepository};
use crate::error::AppError;

/// Cancellation-fee tiers and no-show penalties. The ledger consults
/// `block_status` before granting any new hold.
pub struct PolicyService {
    no_shows: Arc<dyn NoShowRepository>,
    audit: Arc<dyn AuditSink>,
    cancellation: CancellationPolicy,
    no_show_threshold: i64,
    lookback: Duration,
    block_duration: Duration,
}

impl PolicyService {
    pub fn new(no_shows: Arc<dyn NoShowRepository>, audit: Arc<dyn AuditSink>, config: &Config) -> Self {
        Self {
            no_shows,
            audit,
            cancellation: config.cancellation_policy.clone(),
            no_show_threshold: config.no_show_threshold,
            lookback: Duration::days(config.no_show_lookback_days),
            block_duration: Duration::days(config.no_show_block_days),
        }
    }

    pub fn compute_fee(&self, booking: &Booking, now: DateTime<Utc>) -> u8 {
        self.cancellation.fee_for_lead(booking.start_time - now)
    }

    pub async fn record_no_show(
        &self,
        client_id: &str,
        booking_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let record = NoShowRecord::new(client_id.to_string(), Some(booking_id.to_string()), at);
        self.no_shows.record(&record).await?;

        let count = self.no_shows.count_since(client_id, at - self.lookback).await?;
        info!("No-show recorded for client {} ({} in window)", client_id, count);
        if count >= self.no_show_threshold {
            self.audit
                .record(
                    "client_blocked",
                    "policy",
                    client_id,
                    None,
                    Some(format!("{} no-shows within lookback", count)),
                )
                .await?;
        }
        Ok(())
    }

    /// Active block, if any: reached the threshold within the lookback window,
    /// blocked until `block_duration` after the triggering (latest) no-show.
    pub async fn block_status(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BlockStatus>, AppError> {
        let since = now - self.lookback;
        let count = self.no_shows.count_since(client_id, since).await?;
        if count < self.no_show_threshold {
            return Ok(None);
        }
        let Some(latest) = self.no_shows.latest_since(client_id, since).await? else {
            return Ok(None);
        };
        let active_until = latest + self.block_duration;
        if active_until > now {
            Ok(Some(BlockStatus { active_until }))
        } else {
            Ok(None)
        }
    }
}
