//! Bearer-token authentication extractors.
//!
//! Handlers declare what they need in their signature: `RequireAuth` for
//! any signed-in user, `RequireAdmin` for accounts with the admin flag.
//! Both verify the `Authorization: Bearer` token statelessly and load the
//! current account, so a deleted user's token stops working immediately.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token belonging to an admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;

        if !user.is_admin {
            return Err(AppError::Unauthorized("not authorized as admin".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Verify the bearer token and load the account it asserts.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

    let user_id = state
        .tokens()
        .verify(token)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_owned()))?;

    // The token may outlive the account it was issued to.
    UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid or expired token".to_owned()))
}
