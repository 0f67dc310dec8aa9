//! Request extractors for signed-in users.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

/// The signed-in user; rejects the request with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// The signed-in user if a token was sent.
///
/// A missing token is anonymous access; an invalid one is still a 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.id.as_str())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
        Ok(AuthUser(resolve_user(state, token).await?))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(MaybeUser(Some(resolve_user(state, token).await?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn resolve_user(state: &AppState, token: &str) -> Result<User, AppError> {
    let identity = state.verifier.verify(token).await?;
    state.repo.upsert_user(&identity).await
}
