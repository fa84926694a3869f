//! Atom feed of a user's unarchived notices, behind HTTP basic auth.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::Notice;
use herald_engine::notices::{NoticeFilter, NoticeService};
use herald_engine::users::UserService;

use crate::atom::{self, AtomEntry, AtomFeed};
use crate::middleware::basic_auth::BasicAuthUser;
use crate::routes::NOTICES_PATH;
use crate::state::AppState;

pub const FEED_TITLE: &str = "Notices Feed";

pub fn router() -> Router<AppState> {
    Router::new().route("/notices/feed", get(feed_for_user))
}

/// GET /notices/feed: Atom feed for the basic-auth user.
async fn feed_for_user(
    State(state): State<AppState>,
    auth: BasicAuthUser,
) -> Result<Response, AppError> {
    let user = auth.user;
    let notices = NoticeService::latest_for(
        &state.pool,
        user.id,
        NoticeFilter::default(),
        state.config.items_per_feed,
    )
    .await?;
    let updated = NoticeService::latest_added_for(&state.pool, user.id)
        .await?
        .unwrap_or(DateTime::UNIX_EPOCH);

    let mut senders: HashMap<Uuid, String> = HashMap::new();
    for sender_id in notices.iter().filter_map(|n| n.sender_id) {
        if senders.contains_key(&sender_id) {
            continue;
        }
        if let Some(sender) = UserService::get(&state.pool, sender_id).await? {
            senders.insert(sender_id, sender.username);
        }
    }

    tracing::debug!(user_id = %user.id, entries = notices.len(), "Serving notices feed");

    let feed = build_feed(&state.config.site_domain, &notices, &senders, updated);
    Ok(([(header::CONTENT_TYPE, atom::CONTENT_TYPE)], feed.render()).into_response())
}

/// Absolute URL for `path` on the configured site.
fn site_url(domain: &str, path: &str) -> String {
    let domain = domain.trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        format!("{}{}", domain, path)
    } else {
        format!("http://{}{}", domain, path)
    }
}

fn build_feed(
    domain: &str,
    notices: &[Notice],
    senders: &HashMap<Uuid, String>,
    updated: DateTime<Utc>,
) -> AtomFeed {
    let index_url = site_url(domain, NOTICES_PATH);

    let entries = notices
        .iter()
        .map(|notice| {
            let url = site_url(domain, &format!("{}/{}", NOTICES_PATH, notice.id));
            AtomEntry {
                id: url.clone(),
                title: atom::strip_tags(&notice.message),
                link: url,
                updated: notice.added,
                published: notice.added,
                content_html: atom::linebreaks(&notice.message),
                author: notice.sender_id.and_then(|id| senders.get(&id).cloned()),
            }
        })
        .collect();

    AtomFeed {
        id: index_url.clone(),
        title: FEED_TITLE.to_string(),
        link: index_url,
        updated,
        entries,
    }
}
