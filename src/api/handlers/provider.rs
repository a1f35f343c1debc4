use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{
    AvailabilityQuery, CreateProviderRequest, CreateWindowRequest, UpsertExceptionRequest,
};
use crate::api::dtos::responses::{AvailabilityResponse, ResolvedWindow};
use crate::api::extractors::actor::Actor;
use crate::domain::models::provider::{AvailabilityException, AvailabilityWindow, ExceptionKind, Provider};
use crate::domain::services::availability::{parse_hhmm, resolve_windows, validate_new_window};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<CreateProviderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may create providers".into()));
    }
    if payload.timezone.parse::<Tz>().is_err() {
        return Err(AppError::Validation(format!("Unknown timezone '{}'", payload.timezone)));
    }
    let base_capacity = payload.base_capacity.unwrap_or(1);
    if base_capacity < 1 {
        return Err(AppError::Validation("base_capacity must be at least 1".into()));
    }
    let overbooking_pct = payload.overbooking_pct.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&overbooking_pct) {
        return Err(AppError::Validation("overbooking_pct must be between 0 and 1".into()));
    }
    let min_notice_min = payload.min_notice_min.unwrap_or(0);
    if min_notice_min < 0 {
        return Err(AppError::Validation("min_notice_min must not be negative".into()));
    }

    let provider = Provider::new(
        payload.display_name,
        payload.timezone,
        payload.capabilities,
        base_capacity,
        overbooking_pct,
        min_notice_min,
    );
    let created = state.provider_repo.create(&provider).await?;
    info!("Provider created: {}", created.id);
    Ok(Json(created))
}

pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let provider = state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;
    Ok(Json(provider))
}

pub async fn create_window(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
    Json(payload): Json<CreateWindowRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may edit availability".into()));
    }
    state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;

    let window = AvailabilityWindow::new(provider_id.clone(), payload.weekday, payload.start, payload.end);
    let existing = state.provider_repo.list_windows_for_day(&provider_id, payload.weekday).await?;
    validate_new_window(&window, &existing)?;

    let created = state.provider_repo.create_window(&window).await?;
    info!("Availability window created: {} ({} {}-{})", created.id, created.weekday, created.start_time, created.end_time);
    Ok(Json(created))
}

pub async fn delete_window(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path((provider_id, window_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may edit availability".into()));
    }
    state.provider_repo.delete_window(&provider_id, &window_id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

pub async fn upsert_exception(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
    Json(payload): Json<UpsertExceptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may edit availability".into()));
    }
    state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;

    let date = NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;

    match payload.kind {
        ExceptionKind::Added => {
            let (Some(start), Some(end)) = (&payload.start, &payload.end) else {
                return Err(AppError::Validation("ADDED exception requires start and end".into()));
            };
            if parse_hhmm(start)? >= parse_hhmm(end)? {
                return Err(AppError::Validation("Exception start must be before end".into()));
            }
        }
        ExceptionKind::Blocked => {
            if let (Some(start), Some(end)) = (&payload.start, &payload.end) {
                if parse_hhmm(start)? >= parse_hhmm(end)? {
                    return Err(AppError::Validation("Exception start must be before end".into()));
                }
            }
        }
    }

    let exception = AvailabilityException::new(provider_id, date, payload.kind, payload.start, payload.end);
    let created = state.provider_repo.upsert_exception(&exception).await?;
    info!("Availability exception upserted: {} on {}", created.id, created.date);
    Ok(Json(created))
}

pub async fn delete_exception(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path((provider_id, exception_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may edit availability".into()));
    }
    state.provider_repo.delete_exception(&provider_id, &exception_id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

/// Resolved provider-local working intervals for one date.
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;

    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;

    let windows = state.provider_repo.list_windows(&provider_id).await?;
    let exceptions = state.provider_repo.list_exceptions_for_date(&provider_id, date).await?;
    let resolved = resolve_windows(date, &windows, &exceptions)?;

    Ok(Json(AvailabilityResponse {
        date: query.date,
        windows: resolved
            .into_iter()
            .map(|(start, end)| ResolvedWindow {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            })
            .collect(),
    }))
}
