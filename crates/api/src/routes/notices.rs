//! Notice routes: index, detail and lifecycle actions.
//!
//! Archive, delete and mark-all-seen always answer with a redirect. A missing
//! notice or a notice the caller may not touch is logged and otherwise ignored.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::Notice;
use herald_engine::flash::{FlashMessage, FlashStore};
use herald_engine::notices::{NoticeFilter, NoticeService};

use crate::middleware::auth::AuthUser;
use crate::routes::NextQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notices", get(index))
        .route("/notices/mark-all-seen", post(mark_all_seen))
        .route("/notices/{id}", get(single))
        .route("/notices/{id}/archive", post(archive))
        .route("/notices/{id}/delete", post(delete))
}

/// Context for the notices index.
#[derive(Debug, Serialize)]
pub struct NoticesIndex {
    pub notices: Vec<Notice>,
    pub unseen_count: i64,
    pub messages: Vec<FlashMessage>,
}

/// Query parameters for the detail view.
#[derive(Debug, Deserialize)]
pub struct SingleQuery {
    /// Mark the notice seen when viewed. Defaults to `true`.
    pub mark_seen: Option<bool>,
}

/// GET /notices: The user's unarchived on-site notices.
async fn index(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<NoticesIndex>, AppError> {
    let notices = NoticeService::notices_for(&state.pool, auth.id(), NoticeFilter::on_site()).await?;
    let unseen_count = NoticeService::unseen_count_for(&state.pool, auth.id()).await?;

    let mut redis = state.redis.clone();
    let messages = FlashStore::take(&mut redis, auth.id()).await?;

    Ok(Json(NoticesIndex {
        notices,
        unseen_count,
        messages,
    }))
}

/// GET /notices/:id: A single notice, visible to its recipient only.
async fn single(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<SingleQuery>,
) -> Result<Json<Notice>, AppError> {
    let mark_seen = query.mark_seen.unwrap_or(true);
    let notice = NoticeService::view_as(&state.pool, &auth.user, id, mark_seen).await?;
    Ok(Json(notice))
}

/// POST /notices/:id/archive: Archive as recipient or superuser, then redirect.
async fn archive(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(next): Query<NextQuery>,
) -> Result<Redirect, AppError> {
    NoticeService::archive_as(&state.pool, &auth.user, id).await?;
    Ok(Redirect::to(next.target()))
}

/// POST /notices/:id/delete: Delete as recipient or superuser, then redirect.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(next): Query<NextQuery>,
) -> Result<Redirect, AppError> {
    NoticeService::delete_as(&state.pool, &auth.user, id).await?;
    Ok(Redirect::to(next.target()))
}

/// POST /notices/mark-all-seen: Mark every received notice seen, then redirect.
async fn mark_all_seen(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(next): Query<NextQuery>,
) -> Result<Redirect, AppError> {
    NoticeService::mark_all_seen(&state.pool, auth.id()).await?;
    Ok(Redirect::to(next.target()))
}
