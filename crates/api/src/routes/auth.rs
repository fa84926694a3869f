//! Session login: exchanges a username and password for a session token.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_engine::users::UserService;

use crate::middleware::auth::encode_jwt;
use crate::middleware::password::{verify_dummy_password, verify_password_async};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
}

/// POST /api/auth/login: Verify credentials and return a JWT session token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Auth("Invalid username or password".to_string());

    let Some(user) = UserService::get_by_username(&state.pool, &req.username).await? else {
        verify_dummy_password(req.password).await?;
        return Err(invalid());
    };

    let valid = verify_password_async(req.password, user.password_hash.clone()).await?;
    if !valid || !user.is_active {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    let token = encode_jwt(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}
