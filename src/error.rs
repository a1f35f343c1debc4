use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Slot unavailable")]
    SlotUnavailable,
    #[error("Overbooking limit exceeded")]
    OverbookingLimitExceeded,
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Client blocked until {until}")]
    ClientBlocked { until: DateTime<Utc> },
    #[error("Waitlist offer expired")]
    WaitlistOfferExpired,
    #[error("Package reservation failed at sub-slot {failed_index}")]
    PackagePartialFailure { failed_index: usize },
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    // 2067 = SQLite Unique Constraint
                    if db_err.code().unwrap_or_default() == "2067" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" })),
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::SlotUnavailable => (
                StatusCode::CONFLICT,
                json!({ "error": "Slot unavailable", "code": "SLOT_UNAVAILABLE", "retryable": true }),
            ),
            AppError::OverbookingLimitExceeded => (
                StatusCode::CONFLICT,
                json!({ "error": "Fully booked", "code": "OVERBOOKING_LIMIT_EXCEEDED", "retryable": false }),
            ),
            AppError::InvalidTransition { from, to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": format!("Invalid transition: {} -> {}", from, to), "code": "INVALID_TRANSITION" }),
            ),
            AppError::PolicyViolation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": msg, "code": "POLICY_VIOLATION" }),
            ),
            AppError::ClientBlocked { until } => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Client is blocked from booking", "code": "CLIENT_BLOCKED", "blocked_until": until.to_rfc3339() }),
            ),
            AppError::WaitlistOfferExpired => (
                StatusCode::GONE,
                json!({ "error": "Waitlist offer expired", "code": "WAITLIST_OFFER_EXPIRED" }),
            ),
            AppError::PackagePartialFailure { failed_index } => (
                StatusCode::CONFLICT,
                json!({ "error": "Package reservation failed", "code": "PACKAGE_PARTIAL_FAILURE", "failed_index": failed_index }),
            ),
            AppError::PaymentDeclined(msg) => (
                StatusCode::PAYMENT_REQUIRED,
                json!({ "error": msg, "code": "PAYMENT_DECLINED" }),
            ),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal error" })),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}
