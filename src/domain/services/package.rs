use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::booking::{Booking, PaymentMode};
use crate::domain::models::hold::SlotHold;
use crate::domain::models::provider::Provider;
use crate::domain::models::service::ServiceOffering;
use crate::domain::services::ledger::ReservationLedger;
use crate::error::AppError;

/// Reserves an ordered chain of services as one all-or-nothing booking.
/// Holds are acquired in ascending start-time order for every caller, so
/// concurrent packages over overlapping ranges cannot deadlock.
pub struct PackageComposer {
    ledger: Arc<ReservationLedger>,
}

impl PackageComposer {
    pub fn new(ledger: Arc<ReservationLedger>) -> Self {
        Self { ledger }
    }

    pub async fn reserve_package(
        &self,
        provider: &Provider,
        services: &[ServiceOffering],
        start_anchor: DateTime<Utc>,
        client_id: &str,
        mode: PaymentMode,
    ) -> Result<Booking, AppError> {
        if services.is_empty() {
            return Err(AppError::Validation("Package requires at least one service".into()));
        }

        // Each service starts where the prior one ends plus its trailing buffer.
        let mut starts = Vec::with_capacity(services.len());
        let mut cursor = start_anchor;
        for service in services {
            starts.push(cursor);
            cursor = cursor
                + Duration::minutes(service.duration_min as i64)
                + Duration::minutes(service.buffer_after_min as i64);
        }

        let mut acquired: Vec<SlotHold> = Vec::new();
        for (index, (service, start)) in services.iter().zip(&starts).enumerate() {
            match self.ledger.hold(provider, service, *start, client_id).await {
                Ok(hold) => acquired.push(hold),
                Err(e) => {
                    warn!("Package sub-hold {} failed, rolling back {} holds", index, acquired.len());
                    self.release_all(&acquired, client_id).await;
                    return Err(match e {
                        // A blocked client or bad request is not a capacity race.
                        AppError::ClientBlocked { .. } | AppError::Validation(_) => e,
                        _ => AppError::PackagePartialFailure { failed_index: index },
                    });
                }
            }
        }

        match self.ledger.commit_package(acquired.clone(), mode, client_id).await {
            Ok(booking) => {
                info!("Package booked: {} ({} services)", booking.id, services.len());
                Ok(booking)
            }
            Err(e) => {
                self.release_all(&acquired, client_id).await;
                Err(e)
            }
        }
    }

    async fn release_all(&self, holds: &[SlotHold], actor: &str) {
        for hold in holds {
            if let Err(e) = self.ledger.release(&hold.id, actor).await {
                warn!("Rollback release of hold {} failed: {:?}", hold.id, e);
            }
        }
    }
}
