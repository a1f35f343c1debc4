use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::dtos::requests::{
    AdvanceStatusRequest, CancelBookingRequest, CommitHoldRequest, CreateHoldRequest,
};
use crate::api::extractors::actor::{Actor, ActorRole};
use crate::api::handlers::slots::structural_day_slots;
use crate::domain::models::booking::PaymentMode;
use crate::domain::models::provider::Provider;
use crate::error::AppError;
use crate::state::AppState;

/// Parses the client-facing date + wall time ("HH:MM" or RFC 3339) into the
/// provider-local UTC instant. DST-ambiguous or skipped wall times are
/// rejected rather than guessed.
pub(crate) fn parse_local_start(
    provider: &Provider,
    date_raw: &str,
    time_raw: &str,
) -> Result<(NaiveDate, DateTime<Utc>), AppError> {
    let tz: Tz = provider.timezone.parse().unwrap_or(chrono_tz::UTC);

    let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;

    let time = if time_raw.contains('T') {
        let dt = DateTime::parse_from_rfc3339(time_raw)
            .map_err(|_| AppError::Validation("Invalid ISO time format".into()))?;
        dt.with_timezone(&tz).time()
    } else {
        NaiveTime::parse_from_str(time_raw, "%H:%M")
            .map_err(|_| AppError::Validation("Invalid time format (HH:MM)".into()))?
    };

    let start = tz
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or(AppError::Validation("Invalid local time (ambiguous or skipped due to DST)".into()))?
        .with_timezone(&Utc);

    Ok((date, start))
}

/// Phase one of `reserve`: validates the requested slot against the
/// generator, then claims capacity atomically through the ledger.
pub async fn create_hold(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
    Json(payload): Json<CreateHoldRequest>,
) -> Result<impl IntoResponse, AppError> {
    let provider = state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;
    let service = state.service_repo.find_by_id(&payload.service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    let (date, start) = parse_local_start(&provider, &payload.date, &payload.time)?;
    let now = Utc::now();
    if start < now {
        return Err(AppError::Validation("Cannot book in the past".into()));
    }

    let valid_slots = structural_day_slots(&state, &provider, &service, date, now).await?;
    if !valid_slots.iter().any(|s| s.start == start) {
        warn!("Hold rejected: slot {} does not exist for provider {}", start, provider_id);
        return Err(AppError::Validation("Requested time is not a bookable slot".into()));
    }

    let hold = state.ledger.hold(&provider, &service, start, &actor.id).await?;
    Ok(Json(hold))
}

/// Phase two of `reserve`: converts the hold into a booking within the TTL.
pub async fn commit_hold(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(hold_id): Path<String>,
    Json(payload): Json<CommitHoldRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hold = state.reservation_store.find_hold(&hold_id).await?
        .ok_or(AppError::SlotUnavailable)?;
    if actor.role == ActorRole::Client && hold.client_id != actor.id {
        return Err(AppError::Forbidden("Hold belongs to another client".into()));
    }

    let mode = payload.payment_mode.unwrap_or(PaymentMode::Instant);
    let booking = state.ledger.commit(&hold_id, mode, &actor.id).await?;
    Ok(Json(booking))
}

pub async fn release_hold(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(hold_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(hold) = state.reservation_store.find_hold(&hold_id).await? {
        if actor.role == ActorRole::Client && hold.client_id != actor.id {
            return Err(AppError::Forbidden("Hold belongs to another client".into()));
        }
        state.ledger.release(&hold_id, &actor.id).await?;
    }
    Ok(Json(serde_json::json!({ "status": "released" })))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    if actor.role == ActorRole::Client && booking.client_id != actor.id {
        return Err(AppError::Forbidden("Booking belongs to another client".into()));
    }
    Ok(Json(booking))
}

pub async fn list_provider_bookings(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may list bookings".into()));
    }
    let bookings = state.booking_repo.list_by_provider(&provider_id).await?;
    Ok(Json(bookings))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(booking_id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    if actor.role == ActorRole::Client && booking.client_id != actor.id {
        return Err(AppError::Forbidden("Booking belongs to another client".into()));
    }

    let cancelled = state.lifecycle.cancel(&booking_id, &actor.id, payload.reason).await?;
    info!("Booking cancelled via API: {}", cancelled.id);
    Ok(Json(cancelled))
}

pub async fn mark_no_show(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may mark a no-show".into()));
    }
    let booking = state.lifecycle.mark_no_show(&booking_id, &actor.id).await?;
    Ok(Json(booking))
}

pub async fn advance_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(booking_id): Path<String>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may advance a booking".into()));
    }
    let booking = state.lifecycle.advance(&booking_id, payload.to, &actor.id).await?;
    Ok(Json(booking))
}
