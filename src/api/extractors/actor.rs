use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Acting role, authenticated by the upstream gateway and forwarded in
/// headers. Role legality for lifecycle operations is enforced at this
/// boundary; the domain services never re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Client,
    Provider,
    Receptionist,
    Admin,
}

impl ActorRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "client" => Some(ActorRole::Client),
            "provider" => Some(ActorRole::Provider),
            "receptionist" => Some(ActorRole::Receptionist),
            "admin" => Some(ActorRole::Admin),
            _ => None,
        }
    }

    /// Marking in-progress/completed/no-show is staff-only.
    pub fn is_staff(&self) -> bool {
        matches!(self, ActorRole::Provider | ActorRole::Receptionist | ActorRole::Admin)
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?
            .to_string();
        let role = parts
            .headers
            .get("x-actor-role")
            .and_then(|v| v.to_str().ok())
            .and_then(ActorRole::parse)
            .ok_or(AppError::Unauthorized)?;

        Ok(Actor { id, role })
    }
}
