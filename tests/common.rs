use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{Datelike, Duration, Utc};
use scheduling_backend::{
    api::router::create_router,
    background::start_sweeper,
    config::Config,
    domain::models::policy::CancellationPolicy,
    domain::ports::{NotificationDispatcher, PaymentGateway},
    error::AppError,
    infra::factory::assemble_state,
    state::AppState,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
pub struct MockPaymentGateway {
    pub authorizations: Mutex<Vec<(String, i64)>>,
    pub captures: Mutex<Vec<String>>,
    pub refunds: Mutex<Vec<(String, i64)>>,
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn authorize(&self, client_id: &str, amount_cents: i64) -> Result<String, AppError> {
        let auth_id = format!("auth-{}", Uuid::new_v4());
        self.authorizations.lock().unwrap().push((client_id.to_string(), amount_cents));
        Ok(auth_id)
    }

    async fn capture(&self, auth_id: &str) -> Result<(), AppError> {
        self.captures.lock().unwrap().push(auth_id.to_string());
        Ok(())
    }

    async fn refund(&self, auth_id: &str, amount_cents: i64) -> Result<(), AppError> {
        self.refunds.lock().unwrap().push((auth_id.to_string(), amount_cents));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockNotificationDispatcher {
    pub events: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn notify(&self, event_type: &str, recipient: &str, _payload: Value) {
        self.events.lock().unwrap().push((event_type.to_string(), recipient.to_string()));
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub payments: Arc<MockPaymentGateway>,
    pub notifier: Arc<MockNotificationDispatcher>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_ttls(120, 900).await
    }

    pub async fn with_ttls(hold_ttl_secs: i64, offer_ttl_secs: i64) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(StdDuration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            payment_service_url: "http://localhost".to_string(),
            payment_service_token: "token".to_string(),
            notify_service_url: "http://localhost".to_string(),
            notify_service_token: "token".to_string(),
            hold_ttl_secs,
            offer_ttl_secs,
            slot_granularity_min: 0,
            sweep_interval_secs: 1,
            cancellation_policy: CancellationPolicy::parse("24:0,4:50,0:100").unwrap(),
            no_show_threshold: 3,
            no_show_lookback_days: 90,
            no_show_block_days: 30,
        };

        let payments = Arc::new(MockPaymentGateway::default());
        let notifier = Arc::new(MockNotificationDispatcher::default());

        let state = Arc::new(assemble_state(
            config,
            pool.clone(),
            payments.clone(),
            notifier.clone(),
        ));

        let sweeper_state = state.clone();
        tokio::spawn(async move {
            start_sweeper(sweeper_state).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            payments,
            notifier,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        actor: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = actor {
            builder = builder.header("X-Actor-Id", id).header("X-Actor-Role", role);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn create_provider(&self, capabilities: &[&str], base_capacity: i32, overbooking_pct: f64) -> String {
        let res = self
            .request(
                "POST",
                "/api/v1/providers",
                Some(("admin-1", "admin")),
                Some(json!({
                    "display_name": "Ana Souza",
                    "timezone": "UTC",
                    "capabilities": capabilities,
                    "base_capacity": base_capacity,
                    "overbooking_pct": overbooking_pct,
                })),
            )
            .await;
        assert!(res.status().is_success(), "create_provider failed: {}", res.status());
        parse_body(res).await["id"].as_str().unwrap().to_string()
    }

    pub async fn create_service(
        &self,
        name: &str,
        duration_min: i32,
        buffer_before_min: i32,
        buffer_after_min: i32,
        capability: &str,
        price_cents: i64,
    ) -> String {
        let res = self
            .request(
                "POST",
                "/api/v1/services",
                Some(("admin-1", "admin")),
                Some(json!({
                    "name": name,
                    "duration_min": duration_min,
                    "buffer_before_min": buffer_before_min,
                    "buffer_after_min": buffer_after_min,
                    "required_capability": capability,
                    "price_cents": price_cents,
                })),
            )
            .await;
        assert!(res.status().is_success(), "create_service failed: {}", res.status());
        parse_body(res).await["id"].as_str().unwrap().to_string()
    }

    pub async fn add_window(&self, provider_id: &str, weekday: i32, start: &str, end: &str) {
        let res = self
            .request(
                "POST",
                &format!("/api/v1/providers/{}/windows", provider_id),
                Some(("admin-1", "admin")),
                Some(json!({ "weekday": weekday, "start": start, "end": end })),
            )
            .await;
        assert!(res.status().is_success(), "add_window failed: {}", res.status());
    }

    /// Opens 00:00-23:59 on all seven weekdays.
    pub async fn open_all_week(&self, provider_id: &str) {
        for weekday in 0..7 {
            self.add_window(provider_id, weekday, "00:00", "23:59").await;
        }
    }

    pub async fn hold_slot(
        &self,
        provider_id: &str,
        service_id: &str,
        client: &str,
        date: &str,
        time: &str,
    ) -> axum::response::Response {
        self.request(
            "POST",
            &format!("/api/v1/providers/{}/holds", provider_id),
            Some((client, "client")),
            Some(json!({ "service_id": service_id, "date": date, "time": time })),
        )
        .await
    }

    /// Full reserve: hold then instant-capture commit. Returns the booking.
    pub async fn book_slot(
        &self,
        provider_id: &str,
        service_id: &str,
        client: &str,
        date: &str,
        time: &str,
    ) -> Value {
        let hold_res = self.hold_slot(provider_id, service_id, client, date, time).await;
        assert!(hold_res.status().is_success(), "hold failed: {}", hold_res.status());
        let hold = parse_body(hold_res).await;
        let hold_id = hold["id"].as_str().unwrap();

        let commit_res = self
            .request(
                "POST",
                &format!("/api/v1/holds/{}/commit", hold_id),
                Some((client, "client")),
                Some(json!({ "payment_mode": "instant" })),
            )
            .await;
        assert!(commit_res.status().is_success(), "commit failed: {}", commit_res.status());
        parse_body(commit_res).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// First Monday strictly after today, formatted %Y-%m-%d.
#[allow(dead_code)]
pub fn next_monday() -> String {
    let mut date = Utc::now().date_naive() + Duration::days(1);
    while date.weekday() != chrono::Weekday::Mon {
        date += Duration::days(1);
    }
    date.format("%Y-%m-%d").to_string()
}
