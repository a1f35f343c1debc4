use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{NotificationDispatcher, PaymentGateway};
use crate::domain::services::ledger::ReservationLedger;
use crate::domain::services::lifecycle::BookingLifecycle;
use crate::domain::services::package::PackageComposer;
use crate::domain::services::policy::PolicyService;
use crate::domain::services::waitlist::WaitlistService;
use crate::infra::notify::http_notification_dispatcher::HttpNotificationDispatcher;
use crate::infra::payment::http_payment_gateway::HttpPaymentGateway;
use crate::infra::repositories::{
    sqlite_audit_sink::SqliteAuditSink, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_no_show_repo::SqliteNoShowRepo, sqlite_provider_repo::SqliteProviderRepo,
    sqlite_reservation_store::SqliteReservationStore, sqlite_service_repo::SqliteServiceRepo,
    sqlite_waitlist_repo::SqliteWaitlistRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_migrations(&pool).await;

    let payments = Arc::new(HttpPaymentGateway::new(
        config.payment_service_url.clone(),
        config.payment_service_token.clone(),
    ));
    let notifier = Arc::new(HttpNotificationDispatcher::new(
        config.notify_service_url.clone(),
        config.notify_service_token.clone(),
    ));

    assemble_state(config.clone(), pool, payments, notifier)
}

/// Wires repositories and domain services over an existing pool. The test
/// harness calls this directly with mock collaborators.
pub fn assemble_state(
    config: Config,
    pool: SqlitePool,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationDispatcher>,
) -> AppState {
    let provider_repo = Arc::new(SqliteProviderRepo::new(pool.clone()));
    let service_repo = Arc::new(SqliteServiceRepo::new(pool.clone()));
    let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
    let reservation_store = Arc::new(SqliteReservationStore::new(pool.clone()));
    let waitlist_repo = Arc::new(SqliteWaitlistRepo::new(pool.clone()));
    let no_show_repo = Arc::new(SqliteNoShowRepo::new(pool.clone()));
    let audit = Arc::new(SqliteAuditSink::new(pool.clone()));

    let policy = Arc::new(PolicyService::new(no_show_repo, audit.clone(), &config));
    let ledger = Arc::new(ReservationLedger::new(
        reservation_store.clone(),
        policy.clone(),
        payments.clone(),
        notifier.clone(),
        audit.clone(),
        config.hold_ttl_secs,
    ));
    let waitlist = Arc::new(WaitlistService::new(
        waitlist_repo,
        provider_repo.clone(),
        service_repo.clone(),
        ledger.clone(),
        notifier.clone(),
        audit.clone(),
        config.offer_ttl_secs,
    ));
    let lifecycle = Arc::new(BookingLifecycle::new(
        booking_repo.clone(),
        policy.clone(),
        payments,
        waitlist.clone(),
        notifier,
        audit,
    ));
    let packages = Arc::new(PackageComposer::new(ledger.clone()));

    AppState {
        config,
        provider_repo,
        service_repo,
        booking_repo,
        reservation_store,
        policy,
        ledger,
        waitlist,
        lifecycle,
        packages,
    }
}

async fn run_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
