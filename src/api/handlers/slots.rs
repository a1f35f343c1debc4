use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::api::dtos::requests::SlotsQuery;
use crate::api::dtos::responses::SlotsResponse;
use crate::domain::models::provider::Provider;
use crate::domain::models::service::ServiceOffering;
use crate::domain::models::slot::Slot;
use crate::domain::services::availability::resolve_windows;
use crate::domain::services::slots::{generate_slots, OccupiedRange};
use crate::error::AppError;
use crate::state::AppState;

pub(crate) fn day_bounds(tz: Tz, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(AppError::Validation("Invalid date".into()))?;
    let day_start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .ok_or(AppError::Validation("Date does not exist in provider timezone".into()))?
        .with_timezone(&Utc);
    Ok((day_start, day_start + Duration::minutes(1440)))
}

/// Current candidate slots for one provider/service/date, derived from
/// resolved availability minus active bookings and unexpired holds.
pub(crate) async fn compute_day_slots(
    state: &AppState,
    provider: &Provider,
    service: &ServiceOffering,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<Slot>, AppError> {
    let tz: Tz = provider.timezone.parse().unwrap_or(chrono_tz::UTC);
    let (day_start, day_end) = day_bounds(tz, date)?;

    let bookings = state
        .booking_repo
        .list_occupying_in_range(&provider.id, day_start, day_end)
        .await?;
    let holds = state
        .reservation_store
        .list_active_holds_in_range(&provider.id, day_start, day_end, now)
        .await?;

    let occupied: Vec<OccupiedRange> = bookings
        .iter()
        .map(|b| OccupiedRange { block_start: b.block_start, block_end: b.block_end })
        .chain(holds.iter().map(|h| OccupiedRange { block_start: h.block_start, block_end: h.block_end }))
        .collect();

    let windows = state.provider_repo.list_windows(&provider.id).await?;
    let exceptions = state.provider_repo.list_exceptions_for_date(&provider.id, date).await?;
    let resolved = resolve_windows(date, &windows, &exceptions)?;

    Ok(generate_slots(
        provider,
        service,
        date,
        &resolved,
        &occupied,
        state.config.slot_granularity_min,
        now,
    ))
}

/// Candidate slots ignoring occupancy: availability windows, granularity and
/// notice only. The hold path validates shape here and leaves capacity to the
/// ledger, so capacity refusals keep their distinct error codes.
pub(crate) async fn structural_day_slots(
    state: &AppState,
    provider: &Provider,
    service: &ServiceOffering,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<Slot>, AppError> {
    let windows = state.provider_repo.list_windows(&provider.id).await?;
    let exceptions = state.provider_repo.list_exceptions_for_date(&provider.id, date).await?;
    let resolved = resolve_windows(date, &windows, &exceptions)?;

    Ok(generate_slots(
        provider,
        service,
        date,
        &resolved,
        &[],
        state.config.slot_granularity_min,
        now,
    ))
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let provider = state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;
    let service = state.service_repo.find_by_id(&query.service).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    if !provider.has_capability(&service.required_capability) {
        return Err(AppError::Validation(format!(
            "Provider lacks capability '{}'",
            service.required_capability
        )));
    }

    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;

    let slots = compute_day_slots(&state, &provider, &service, date, Utc::now()).await?;

    Ok(Json(SlotsResponse { date: query.date, slots }))
}
