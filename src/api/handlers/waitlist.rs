use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::dtos::requests::JoinWaitlistRequest;
use crate::api::extractors::actor::{Actor, ActorRole};
use crate::error::AppError;
use crate::state::AppState;

pub async fn join_waitlist(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
    Json(payload): Json<JoinWaitlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .waitlist
        .join(
            &provider_id,
            &payload.service_id,
            &actor.id,
            payload.window_start,
            payload.window_end,
        )
        .await?;
    Ok(Json(entry))
}

pub async fn confirm_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.waitlist.confirm_offer(&entry_id, &actor.id).await?;
    Ok(Json(booking))
}

pub async fn cancel_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.waitlist.get(&entry_id).await?
        .ok_or(AppError::NotFound("Waitlist entry not found".into()))?;
    if actor.role == ActorRole::Client && entry.client_id != actor.id {
        return Err(AppError::Forbidden("Offer belongs to another client".into()));
    }
    state.waitlist.cancel_offer(&entry_id).await?;
    Ok(Json(serde_json::json!({ "status": "cancelled" })))
}

pub async fn list_waitlist(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !actor.role.is_staff() {
        return Err(AppError::Forbidden("Only staff may list the waitlist".into()));
    }
    let entries = state.waitlist.list_by_provider(&provider_id).await?;
    Ok(Json(entries))
}
