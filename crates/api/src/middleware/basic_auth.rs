//! HTTP basic authentication for endpoints consumed by feed readers, which
//! cannot carry session tokens.
//!
//! Failure always answers `401` with a `WWW-Authenticate: Basic` challenge so
//! clients prompt for credentials.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use herald_common::error::AppError;
use herald_common::types::User;
use herald_engine::users::UserService;

use crate::middleware::password::{verify_dummy_password, verify_password_async};
use crate::state::AppState;

/// Realm advertised by the notices feed.
pub const FEED_REALM: &str = "Notices Feed";

/// Username/password pair from an `Authorization: Basic` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse `Basic base64(username:password)`. The scheme is case-insensitive.
pub fn parse_basic_credentials(header: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// User authenticated with HTTP basic auth.
#[derive(Debug, Clone)]
pub struct BasicAuthUser {
    pub user: User,
}

impl FromRequestParts<AppState> for BasicAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let challenge = || AppError::Challenge(FEED_REALM.to_string());

        let credentials = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_basic_credentials)
            .ok_or_else(challenge)?;

        let Some(user) = UserService::get_by_username(&state.pool, &credentials.username).await?
        else {
            tracing::debug!(username = %credentials.username, "Basic auth for unknown user");
            verify_dummy_password(credentials.password).await?;
            return Err(challenge());
        };

        let valid = verify_password_async(credentials.password, user.password_hash.clone()).await?;
        if !valid || !user.is_active {
            tracing::debug!(user_id = %user.id, "Basic auth rejected");
            return Err(challenge());
        }

        Ok(BasicAuthUser { user })
    }
}
