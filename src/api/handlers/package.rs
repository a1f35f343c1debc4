use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dtos::requests::ReservePackageRequest;
use crate::api::extractors::actor::Actor;
use crate::api::handlers::booking::parse_local_start;
use crate::domain::models::booking::PaymentMode;
use crate::error::AppError;
use crate::state::AppState;

/// All-or-nothing reservation of an ordered service chain anchored at one
/// start time.
pub async fn reserve_package(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
    Json(payload): Json<ReservePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let provider = state.provider_repo.find_by_id(&provider_id).await?
        .ok_or(AppError::NotFound("Provider not found".into()))?;

    let mut services = Vec::with_capacity(payload.service_ids.len());
    for service_id in &payload.service_ids {
        let service = state.service_repo.find_by_id(service_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))?;
        services.push(service);
    }

    let (_, anchor) = parse_local_start(&provider, &payload.date, &payload.time)?;
    if anchor < Utc::now() {
        return Err(AppError::Validation("Cannot book in the past".into()));
    }

    let mode = payload.payment_mode.unwrap_or(PaymentMode::Instant);
    let booking = state
        .packages
        .reserve_package(&provider, &services, anchor, &actor.id, mode)
        .await?;
    Ok(Json(booking))
}
