pub mod auth;
pub mod feed;
pub mod health;
pub mod notices;
pub mod settings;

use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// Where notice actions land when no `next` target is given.
pub const NOTICES_PATH: &str = "/notices";

/// `?next=` redirect target accepted by the notice actions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl NextQuery {
    /// The requested target, or the notices index when absent or blank.
    pub fn target(&self) -> &str {
        non_blank(self.next.as_deref()).unwrap_or(NOTICES_PATH)
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(notices::router())
        .merge(settings::router())
        .merge(feed::router())
        .with_state(state)
}
