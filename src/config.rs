use std::env;

use crate::domain::models::policy::CancellationPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub payment_service_url: String,
    pub payment_service_token: String,
    pub notify_service_url: String,
    pub notify_service_token: String,
    /// Seconds a hold stays reserved while the client completes checkout.
    pub hold_ttl_secs: i64,
    /// Seconds a waitlist offer stays open before cascading to the next entry.
    pub offer_ttl_secs: i64,
    /// Step between generated slot starts in minutes. 0 = step by service duration.
    pub slot_granularity_min: u32,
    pub sweep_interval_secs: u64,
    pub cancellation_policy: CancellationPolicy,
    pub no_show_threshold: i64,
    pub no_show_lookback_days: i64,
    pub no_show_block_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let tiers_raw = env::var("CANCELLATION_TIERS").unwrap_or_else(|_| "24:0,4:50,0:100".to_string());
        let cancellation_policy = CancellationPolicy::parse(&tiers_raw)
            .expect("CANCELLATION_TIERS must be a descending list of hours:fee_pct ending at 0");

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            payment_service_url: env::var("PAYMENT_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1/payments".to_string()),
            payment_service_token: env::var("PAYMENT_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            notify_service_url: env::var("NOTIFY_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8200/api/v1/notify".to_string()),
            notify_service_token: env::var("NOTIFY_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            hold_ttl_secs: env::var("HOLD_TTL_SECS").unwrap_or_else(|_| "120".to_string()).parse().expect("HOLD_TTL_SECS must be a number"),
            offer_ttl_secs: env::var("OFFER_TTL_SECS").unwrap_or_else(|_| "900".to_string()).parse().expect("OFFER_TTL_SECS must be a number"),
            slot_granularity_min: env::var("SLOT_GRANULARITY_MIN").unwrap_or_else(|_| "0".to_string()).parse().expect("SLOT_GRANULARITY_MIN must be a number"),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS").unwrap_or_else(|_| "2".to_string()).parse().expect("SWEEP_INTERVAL_SECS must be a number"),
            cancellation_policy,
            no_show_threshold: env::var("NO_SHOW_THRESHOLD").unwrap_or_else(|_| "3".to_string()).parse().expect("NO_SHOW_THRESHOLD must be a number"),
            no_show_lookback_days: env::var("NO_SHOW_LOOKBACK_DAYS").unwrap_or_else(|_| "90".to_string()).parse().expect("NO_SHOW_LOOKBACK_DAYS must be a number"),
            no_show_block_days: env::var("NO_SHOW_BLOCK_DAYS").unwrap_or_else(|_| "30".to_string()).parse().expect("NO_SHOW_BLOCK_DAYS must be a number"),
        }
    }
}
