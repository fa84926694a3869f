//! Notice settings matrix: view and save per-medium delivery preferences.
//!
//! The form posts one checkbox per cell named `{label}_{medium}`; unchecked
//! boxes are simply absent. Requests sent with `X-Requested-With:
//! XMLHttpRequest` get only the matrix partial.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use herald_common::error::AppError;
use herald_common::types::NoticeType;
use herald_engine::flash::{FlashMessage, FlashStore};
use herald_engine::settings::{SETTINGS_SAVED_MESSAGE, SettingsMatrix, SettingsSubmission};

use crate::middleware::auth::AuthUser;
use crate::routes::{NextQuery, non_blank};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/notices/settings", get(show).post(save))
}

/// Submitted settings form: the optional redirect target plus every checkbox.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub next: Option<String>,
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

/// Full settings page context.
#[derive(Debug, Serialize)]
pub struct SettingsPage {
    pub notice_types: Vec<NoticeType>,
    pub notice_settings: SettingsMatrix,
    pub messages: Vec<FlashMessage>,
}

/// AJAX partial context.
#[derive(Debug, Serialize)]
pub struct SettingsPartial {
    pub notice_settings: SettingsMatrix,
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// GET /notices/settings: Render the matrix.
async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let matrix = SettingsMatrix::build(&state.pool, auth.id(), None).await?;
    render(&state, &auth, &headers, matrix).await
}

/// POST /notices/settings: Apply checkbox changes, then redirect to `next` or
/// re-render the matrix.
///
/// `next` is read from the form body first, then the query string.
async fn save(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Query(query): Query<NextQuery>,
    Form(form): Form<SettingsForm>,
) -> Result<Response, AppError> {
    let submission = SettingsSubmission::new(form.fields);
    let matrix = SettingsMatrix::build(&state.pool, auth.id(), Some(&submission)).await?;

    let next = non_blank(form.next.as_deref()).or_else(|| non_blank(query.next.as_deref()));
    if let Some(next) = next {
        let mut redis = state.redis.clone();
        FlashStore::push(
            &mut redis,
            auth.id(),
            &FlashMessage::info(SETTINGS_SAVED_MESSAGE),
        )
        .await?;
        return Ok(Redirect::to(next).into_response());
    }

    render(&state, &auth, &headers, matrix).await
}

async fn render(
    state: &AppState,
    auth: &AuthUser,
    headers: &HeaderMap,
    matrix: SettingsMatrix,
) -> Result<Response, AppError> {
    if is_ajax(headers) {
        return Ok(Json(SettingsPartial {
            notice_settings: matrix,
        })
        .into_response());
    }

    let mut redis = state.redis.clone();
    let messages = FlashStore::take(&mut redis, auth.id()).await?;

    Ok(Json(SettingsPage {
        notice_types: matrix.notice_types().into_iter().cloned().collect(),
        notice_settings: matrix,
        messages,
    })
    .into_response())
}
