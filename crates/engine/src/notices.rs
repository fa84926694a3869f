//! Notice lifecycle service: listing, viewing, archiving, deleting and
//! marking notices seen.
//!
//! Mutations go through `*_as` methods that take the acting user and apply
//! [`can_modify`] before touching the row. A notice's recipient is never
//! updated once the row exists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{Notice, User};

/// Service layer for notice queries and lifecycle actions.
pub struct NoticeService;

/// Filter for [`NoticeService::notices_for`].
#[derive(Debug, Clone, Copy)]
pub struct NoticeFilter {
    /// Include archived notices. When `false`, only unarchived notices match.
    pub archived: bool,
    pub unseen: Option<bool>,
    pub on_site: Option<bool>,
    /// Select notices the user sent rather than received.
    pub sent: bool,
}

impl Default for NoticeFilter {
    fn default() -> Self {
        Self {
            archived: false,
            unseen: None,
            on_site: None,
            sent: false,
        }
    }
}

impl NoticeFilter {
    pub fn on_site() -> Self {
        Self {
            on_site: Some(true),
            ..Self::default()
        }
    }

    pub fn unseen() -> Self {
        Self {
            unseen: Some(true),
            ..Self::default()
        }
    }
}

/// Parameters for creating a notice.
#[derive(Debug, Clone)]
pub struct CreateNoticeParams {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub notice_type_id: Uuid,
    pub message: String,
    pub on_site: bool,
}

/// Result of a guarded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied,
    NotFound,
    Forbidden,
}

/// Whether `actor` may archive or delete `notice`: recipient or superuser.
pub fn can_modify(actor: &User, notice: &Notice) -> bool {
    actor.id == notice.recipient_id || actor.is_superuser
}

impl NoticeService {
    /// Insert a new notice. New notices are unseen and unarchived.
    pub async fn create(pool: &PgPool, params: &CreateNoticeParams) -> Result<Notice, AppError> {
        let notice: Notice = sqlx::query_as(
            r#"
            INSERT INTO notices (recipient_id, sender_id, notice_type_id, message, added, unseen, archived, on_site)
            VALUES ($1, $2, $3, $4, $5, true, false, $6)
            RETURNING *
            "#,
        )
        .bind(params.recipient_id)
        .bind(params.sender_id)
        .bind(params.notice_type_id)
        .bind(&params.message)
        .bind(Utc::now())
        .bind(params.on_site)
        .fetch_one(pool)
        .await?;

        tracing::debug!(
            notice_id = %notice.id,
            recipient_id = %notice.recipient_id,
            "Notice created"
        );

        Ok(notice)
    }

    /// List notices for a user, newest first.
    pub async fn notices_for(
        pool: &PgPool,
        user_id: Uuid,
        filter: NoticeFilter,
    ) -> Result<Vec<Notice>, AppError> {
        Self::query_for(pool, user_id, filter, None).await
    }

    /// List at most `limit` notices for a user, newest first.
    pub async fn latest_for(
        pool: &PgPool,
        user_id: Uuid,
        filter: NoticeFilter,
        limit: i64,
    ) -> Result<Vec<Notice>, AppError> {
        Self::query_for(pool, user_id, filter, Some(limit.max(0))).await
    }

    async fn query_for(
        pool: &PgPool,
        user_id: Uuid,
        filter: NoticeFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Notice>, AppError> {
        let notices: Vec<Notice> = sqlx::query_as(
            r#"
            SELECT *
            FROM notices
            WHERE (CASE WHEN $2 THEN sender_id ELSE recipient_id END) = $1
              AND ($3 OR archived = false)
              AND ($4::bool IS NULL OR unseen = $4)
              AND ($5::bool IS NULL OR on_site = $5)
            ORDER BY added DESC
            LIMIT $6
            "#,
        )
        .bind(user_id)
        .bind(filter.sent)
        .bind(filter.archived)
        .bind(filter.unseen)
        .bind(filter.on_site)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(notices)
    }

    /// Number of unarchived, unseen notices a user has received.
    pub async fn unseen_count_for(pool: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notices WHERE recipient_id = $1 AND unseen = true AND archived = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Get a single notice by ID.
    pub async fn get(pool: &PgPool, notice_id: Uuid) -> Result<Option<Notice>, AppError> {
        let notice: Option<Notice> = sqlx::query_as("SELECT * FROM notices WHERE id = $1")
            .bind(notice_id)
            .fetch_optional(pool)
            .await?;

        Ok(notice)
    }

    /// View a notice as its recipient, marking it seen when `mark_seen` is set.
    ///
    /// Ownership is strict: superusers get the same 404 as everyone else.
    pub async fn view_as(
        pool: &PgPool,
        actor: &User,
        notice_id: Uuid,
        mark_seen: bool,
    ) -> Result<Notice, AppError> {
        let not_found = || AppError::NotFound(format!("Notice {} not found", notice_id));

        let mut notice = Self::get(pool, notice_id).await?.ok_or_else(not_found)?;
        if notice.recipient_id != actor.id {
            tracing::debug!(
                notice_id = %notice_id,
                user_id = %actor.id,
                "Notice view denied: not the recipient"
            );
            return Err(not_found());
        }

        if mark_seen && notice.unseen {
            sqlx::query("UPDATE notices SET unseen = false WHERE id = $1")
                .bind(notice_id)
                .execute(pool)
                .await?;
            notice.unseen = false;
        }

        Ok(notice)
    }

    /// Archive a notice if `actor` is its recipient or a superuser.
    pub async fn archive_as(
        pool: &PgPool,
        actor: &User,
        notice_id: Uuid,
    ) -> Result<ActionOutcome, AppError> {
        let outcome = Self::authorize(pool, actor, notice_id).await?;
        if outcome == ActionOutcome::Applied {
            sqlx::query("UPDATE notices SET archived = true WHERE id = $1")
                .bind(notice_id)
                .execute(pool)
                .await?;
        }

        Self::log_outcome("archive", actor, notice_id, outcome);
        Ok(outcome)
    }

    /// Delete a notice if `actor` is its recipient or a superuser.
    pub async fn delete_as(
        pool: &PgPool,
        actor: &User,
        notice_id: Uuid,
    ) -> Result<ActionOutcome, AppError> {
        let outcome = Self::authorize(pool, actor, notice_id).await?;
        if outcome == ActionOutcome::Applied {
            sqlx::query("DELETE FROM notices WHERE id = $1")
                .bind(notice_id)
                .execute(pool)
                .await?;
        }

        Self::log_outcome("delete", actor, notice_id, outcome);
        Ok(outcome)
    }

    /// Clear `unseen` on every notice `user_id` has received. Returns rows updated.
    pub async fn mark_all_seen(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE notices SET unseen = false WHERE recipient_id = $1 AND unseen = true")
                .bind(user_id)
                .execute(pool)
                .await?;

        let updated = result.rows_affected();
        tracing::info!(user_id = %user_id, updated, "Marked all notices seen");

        Ok(updated)
    }

    /// Most recent `added` among a user's received notices.
    pub async fn latest_added_for(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let (latest,): (Option<DateTime<Utc>>,) =
            sqlx::query_as("SELECT MAX(added) FROM notices WHERE recipient_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(latest)
    }

    async fn authorize(
        pool: &PgPool,
        actor: &User,
        notice_id: Uuid,
    ) -> Result<ActionOutcome, AppError> {
        Ok(match Self::get(pool, notice_id).await? {
            None => ActionOutcome::NotFound,
            Some(notice) if can_modify(actor, &notice) => ActionOutcome::Applied,
            Some(_) => ActionOutcome::Forbidden,
        })
    }

    fn log_outcome(action: &str, actor: &User, notice_id: Uuid, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Applied => tracing::info!(
                action,
                notice_id = %notice_id,
                user_id = %actor.id,
                superuser = actor.is_superuser,
                "Notice updated"
            ),
            ActionOutcome::NotFound | ActionOutcome::Forbidden => tracing::debug!(
                action,
                notice_id = %notice_id,
                user_id = %actor.id,
                outcome = ?outcome,
                "Notice action skipped"
            ),
        }
    }
}
