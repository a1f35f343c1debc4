use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Scan-based sweeper: the TTL timers of the design are realized as periodic
/// scans, so a crashed process can never leak reserved capacity. Expired
/// holds only stop counting toward occupancy the moment their deadline
/// passes (occupancy queries filter on it); this loop merely garbage-collects
/// the rows and cascades expired waitlist offers to the next entry in line.
pub async fn start_sweeper(state: Arc<AppState>) {
    info!("Starting reservation sweeper...");

    let interval = Duration::from_secs(state.config.sweep_interval_secs);
    loop {
        let now = Utc::now();

        match state.reservation_store.purge_expired_holds(now).await {
            Ok(0) => {}
            Ok(purged) => debug!("Purged {} expired holds", purged),
            Err(e) => error!("Failed to purge expired holds: {:?}", e),
        }

        match state.waitlist.sweep_expired_offers(now).await {
            Ok(0) => {}
            Ok(swept) => debug!("Expired {} stale waitlist offers", swept),
            Err(e) => error!("Failed to sweep waitlist offers: {:?}", e),
        }

        sleep(interval).await;
    }
}
