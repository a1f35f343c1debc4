pub mod sqlite_audit_sink;
pub mod sqlite_booking_repo;
pub mod sqlite_no_show_repo;
pub mod sqlite_provider_repo;
pub mod sqlite_reservation_store;
pub mod sqlite_service_repo;
pub mod sqlite_waitlist_repo;
