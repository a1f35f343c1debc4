use std::sync::Arc;

use crate::config::Config;
use crate::domain::ports::{
    BookingRepository, ProviderRepository, ReservationStore, ServiceRepository,
};
use crate::domain::services::ledger::ReservationLedger;
use crate::domain::services::lifecycle::BookingLifecycle;
use crate::domain::services::package::PackageComposer;
use crate::domain::services::policy::PolicyService;
use crate::domain::services::waitlist::WaitlistService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub provider_repo: Arc<dyn ProviderRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub reservation_store: Arc<dyn ReservationStore>,
    pub policy: Arc<PolicyService>,
    pub ledger: Arc<ReservationLedger>,
    pub waitlist: Arc<WaitlistService>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub packages: Arc<PackageComposer>,
}
