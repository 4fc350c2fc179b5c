//! Bearer Authentication
//!
//! Extractors resolving the `Authorization` header through the configured
//! identity provider.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use lms_core::{LmsError, Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Any signed-in user
#[derive(Clone, Debug)]
pub struct AuthUser(pub UserId);

/// A signed-in user whose role is `educator`
#[derive(Clone, Debug)]
pub struct Educator(pub UserId);

fn bearer(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = state.identity()?;
        let token = bearer(parts)
            .ok_or_else(|| LmsError::Unauthorized("Missing bearer token".into()))?;

        let user_id = identity.authenticate(token).await?;
        Ok(Self(user_id))
    }
}

impl FromRequestParts<AppState> for Educator {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;

        if state.identity()?.role(&user_id).await? != Role::Educator {
            tracing::debug!(user_id = %user_id, "Educator route denied");
            return Err(LmsError::Forbidden("Unauthorized Access".into()).into());
        }
        Ok(Self(user_id))
    }
}
