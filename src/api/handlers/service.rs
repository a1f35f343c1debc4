use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CreateServiceRequest;
use crate::api::extractors::actor::Actor;
use crate::domain::models::service::ServiceOffering;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may create services".into()));
    }
    if payload.duration_min <= 0 {
        return Err(AppError::Validation("duration_min must be positive".into()));
    }
    let buffer_before = payload.buffer_before_min.unwrap_or(0);
    let buffer_after = payload.buffer_after_min.unwrap_or(0);
    if buffer_before < 0 || buffer_after < 0 {
        return Err(AppError::Validation("Buffers must not be negative".into()));
    }
    let price_cents = payload.price_cents.unwrap_or(0);
    if price_cents < 0 {
        return Err(AppError::Validation("price_cents must not be negative".into()));
    }

    let service = ServiceOffering::new(
        payload.name,
        payload.duration_min,
        buffer_before,
        buffer_after,
        payload.required_capability,
        price_cents,
    );
    let created = state.service_repo.create(&service).await?;
    info!("Service created: {} ({})", created.id, created.name);
    Ok(Json(created))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = state.service_repo.find_by_id(&service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;
    Ok(Json(service))
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service_repo.list().await?))
}
