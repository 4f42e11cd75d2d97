//! User and authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use techshop_core::{Email, UserId};

use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated identity: the account plus a fresh bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub is_admin: bool,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            token,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account.
///
/// # Errors
///
/// Returns 409 when the email is already registered, 400 on invalid input.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth
        .register(&body.name, &body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

/// Authenticate with email and password.
///
/// # Errors
///
/// Returns 401 with a generic message for unknown email and wrong password
/// alike.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth.login(&body.email, &body.password).await?;

    Ok(Json(AuthResponse::new(user, token)))
}

/// List all users (admin only).
///
/// # Errors
///
/// Returns 401 unless the caller is an admin.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}
