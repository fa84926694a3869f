//! Notice type registry.
//!
//! Notice types are the rows of the settings matrix and the `label` a sender
//! refers to when emitting a notice.

use sqlx::PgPool;

use herald_common::error::AppError;
use herald_common::types::NoticeType;

/// Default sensitivity for new notice types: on for every medium.
pub const DEFAULT_SENSITIVITY: i32 = 2;

/// Service layer for notice type lookups and registration.
pub struct NoticeTypeService;

/// Parameters for registering a notice type.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateNoticeTypeParams {
    pub label: String,
    pub display: String,
    pub description: String,
    pub default_sensitivity: Option<i32>,
}

impl NoticeTypeService {
    /// List every notice type, ordered by label.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<NoticeType>, AppError> {
        let types: Vec<NoticeType> = sqlx::query_as("SELECT * FROM notice_types ORDER BY label")
            .fetch_all(pool)
            .await?;

        Ok(types)
    }

    /// Look up a notice type by its unique label.
    pub async fn get_by_label(pool: &PgPool, label: &str) -> Result<NoticeType, AppError> {
        let notice_type: NoticeType = sqlx::query_as("SELECT * FROM notice_types WHERE label = $1")
            .bind(label)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notice type '{}' not found", label)))?;

        Ok(notice_type)
    }

    /// Create a notice type, or update display/description/default of an existing label.
    pub async fn create_or_update(
        pool: &PgPool,
        params: &CreateNoticeTypeParams,
    ) -> Result<NoticeType, AppError> {
        let label = params.label.trim();
        if label.is_empty() {
            return Err(AppError::Validation(
                "Notice type label must not be empty".to_string(),
            ));
        }
        if label.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "Notice type label '{}' must not contain whitespace",
                label
            )));
        }

        let notice_type: NoticeType = sqlx::query_as(
            r#"
            INSERT INTO notice_types (label, display, description, default_sensitivity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (label) DO UPDATE
            SET display = EXCLUDED.display,
                description = EXCLUDED.description,
                default_sensitivity = EXCLUDED.default_sensitivity
            RETURNING *
            "#,
        )
        .bind(label)
        .bind(&params.display)
        .bind(&params.description)
        .bind(params.default_sensitivity.unwrap_or(DEFAULT_SENSITIVITY))
        .fetch_one(pool)
        .await?;

        tracing::info!(
            notice_type_id = %notice_type.id,
            label = %notice_type.label,
            "Notice type registered"
        );

        Ok(notice_type)
    }
}
