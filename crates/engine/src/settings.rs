//! Notice settings matrix.
//!
//! Rows are notice types, columns are [`NoticeMedium::ALL`], and each cell is
//! the form field name plus the stored `send` flag for that
//! `(user, notice_type, medium)` triple. Settings that were never stored are
//! materialized with the medium's default on first access.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{NoticeMedium, NoticeSetting, NoticeType};

use crate::notice_types::NoticeTypeService;

/// One-time message shown after a successful settings save.
pub const SETTINGS_SAVED_MESSAGE: &str = "Your notification settings have been saved.";

/// Checkbox value browsers submit for a checked box.
const CHECKED: &str = "on";

/// Form field name for a settings cell: `{label}_{medium_id}`.
pub fn form_label(notice_type: &NoticeType, medium: NoticeMedium) -> String {
    format!("{}_{}", notice_type.label, medium.id())
}

/// Submitted settings form fields, keyed by [`form_label`].
///
/// Unchecked checkboxes are never submitted, so an absent field reads as `false`.
#[derive(Debug, Clone, Default)]
pub struct SettingsSubmission {
    fields: HashMap<String, String>,
}

impl SettingsSubmission {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn is_checked(&self, form_label: &str) -> bool {
        self.fields.get(form_label).is_some_and(|v| v == CHECKED)
    }

    /// The value to persist for a cell, or `None` when the stored value already matches.
    pub fn change_for(&self, form_label: &str, stored: bool) -> Option<bool> {
        let desired = self.is_checked(form_label);
        (desired != stored).then_some(desired)
    }
}

impl FromIterator<(String, String)> for SettingsSubmission {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A single checkbox in the matrix.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsCell {
    pub form_label: String,
    pub medium: NoticeMedium,
    pub send: bool,
}

/// One notice type and its cells, in column order.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsRow {
    pub notice_type: NoticeType,
    pub cells: Vec<SettingsCell>,
}

/// Notice type x medium table of `send` flags for one user.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsMatrix {
    pub column_headers: Vec<&'static str>,
    pub rows: Vec<SettingsRow>,
}

impl SettingsMatrix {
    /// Build the matrix for `user_id`, applying `submission` first when present.
    ///
    /// Only cells whose submitted state differs from the stored state are written.
    pub async fn build(
        pool: &PgPool,
        user_id: Uuid,
        submission: Option<&SettingsSubmission>,
    ) -> Result<Self, AppError> {
        let notice_types = NoticeTypeService::list_all(pool).await?;
        let mut rows = Vec::with_capacity(notice_types.len());
        let mut changed = 0u32;

        for notice_type in notice_types {
            let mut cells = Vec::with_capacity(NoticeMedium::ALL.len());
            for medium in NoticeMedium::ALL {
                let label = form_label(&notice_type, medium);
                let mut setting = get_notification_setting(pool, user_id, &notice_type, medium).await?;

                if let Some(send) = submission.and_then(|s| s.change_for(&label, setting.send)) {
                    update_send(pool, setting.id, send).await?;
                    setting.send = send;
                    changed += 1;
                }

                cells.push(SettingsCell {
                    form_label: label,
                    medium,
                    send: setting.send,
                });
            }
            rows.push(SettingsRow { notice_type, cells });
        }

        if submission.is_some() {
            tracing::info!(user_id = %user_id, changed, "Notice settings saved");
        }

        Ok(Self {
            column_headers: NoticeMedium::ALL.iter().map(|m| m.display()).collect(),
            rows,
        })
    }

    /// Notice types in row order.
    pub fn notice_types(&self) -> Vec<&NoticeType> {
        self.rows.iter().map(|r| &r.notice_type).collect()
    }

    /// Look up a cell by its form label.
    pub fn cell(&self, form_label: &str) -> Option<&SettingsCell> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .find(|c| c.form_label == form_label)
    }
}

/// Fetch the stored setting for a triple, persisting the medium default if absent.
///
/// Reads of an existing row do not write. Concurrent first access is safe: the
/// losing insert does nothing and the follow-up select sees the winner's row.
pub async fn get_notification_setting(
    pool: &PgPool,
    user_id: Uuid,
    notice_type: &NoticeType,
    medium: NoticeMedium,
) -> Result<NoticeSetting, AppError> {
    if let Some(setting) = find_setting(pool, user_id, notice_type, medium).await? {
        return Ok(setting);
    }

    let default = medium.default_send(notice_type.default_sensitivity);
    let inserted: Option<NoticeSetting> = sqlx::query_as(
        r#"
        INSERT INTO notice_settings (user_id, notice_type_id, medium, send)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, notice_type_id, medium) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(notice_type.id)
    .bind(medium.id())
    .bind(default)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(setting) => Ok(setting),
        None => find_setting(pool, user_id, notice_type, medium)
            .await?
            .ok_or_else(|| AppError::Internal("Notice setting vanished after insert".to_string())),
    }
}

async fn find_setting(
    pool: &PgPool,
    user_id: Uuid,
    notice_type: &NoticeType,
    medium: NoticeMedium,
) -> Result<Option<NoticeSetting>, AppError> {
    let setting: Option<NoticeSetting> = sqlx::query_as(
        "SELECT * FROM notice_settings WHERE user_id = $1 AND notice_type_id = $2 AND medium = $3",
    )
    .bind(user_id)
    .bind(notice_type.id)
    .bind(medium.id())
    .fetch_optional(pool)
    .await?;

    Ok(setting)
}

/// Whether `user_id` wants notices of `notice_type` over `medium`.
pub async fn should_send(
    pool: &PgPool,
    user_id: Uuid,
    notice_type: &NoticeType,
    medium: NoticeMedium,
) -> Result<bool, AppError> {
    Ok(get_notification_setting(pool, user_id, notice_type, medium)
        .await?
        .send)
}

async fn update_send(pool: &PgPool, setting_id: Uuid, send: bool) -> Result<(), AppError> {
    sqlx::query("UPDATE notice_settings SET send = $1 WHERE id = $2")
        .bind(send)
        .bind(setting_id)
        .execute(pool)
        .await?;
    Ok(())
}
