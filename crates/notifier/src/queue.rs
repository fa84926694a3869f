//! Pending-notice queue stored in `notice_queue_batches`.
//!
//! Each batch row holds a JSON array of [`QueuedNotice`] written by one
//! `queue` call; the emission job replays and deletes batches oldest first.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::NoticeQueueBatch;

/// What to send, independent of who receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeRequest {
    /// Notice type label.
    pub label: String,
    #[serde(default)]
    pub extra_context: serde_json::Value,
    #[serde(default = "default_on_site")]
    pub on_site: bool,
    #[serde(default)]
    pub sender_id: Option<Uuid>,
}

fn default_on_site() -> bool {
    true
}

impl NoticeRequest {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            extra_context: serde_json::Value::Null,
            on_site: true,
            sender_id: None,
        }
    }

    pub fn with_context(mut self, extra_context: serde_json::Value) -> Self {
        self.extra_context = extra_context;
        self
    }

    pub fn with_sender(mut self, sender_id: Uuid) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn off_site(mut self) -> Self {
        self.on_site = false;
        self
    }
}

/// One recipient's entry in a queued batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedNotice {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub request: NoticeRequest,
}

/// Queue storage operations.
pub struct NoticeQueue;

impl NoticeQueue {
    /// Store one batch with an entry per user. Returns the batch ID.
    pub async fn enqueue(
        pool: &PgPool,
        user_ids: &[Uuid],
        request: &NoticeRequest,
    ) -> Result<Uuid, AppError> {
        let entries = build_entries(user_ids, request);
        let payload = serde_json::to_value(&entries)
            .map_err(|e| AppError::Internal(format!("Failed to encode queue batch: {}", e)))?;

        let (id,): (Uuid,) =
            sqlx::query_as("INSERT INTO notice_queue_batches (payload) VALUES ($1) RETURNING id")
                .bind(&payload)
                .fetch_one(pool)
                .await?;

        tracing::info!(
            batch_id = %id,
            label = %request.label,
            recipients = entries.len(),
            "Notices queued"
        );

        Ok(id)
    }

    /// All batches, oldest first.
    pub async fn pending(pool: &PgPool) -> Result<Vec<NoticeQueueBatch>, AppError> {
        let batches: Vec<NoticeQueueBatch> =
            sqlx::query_as("SELECT * FROM notice_queue_batches ORDER BY created_at, id")
                .fetch_all(pool)
                .await?;

        Ok(batches)
    }

    pub async fn remove(pool: &PgPool, batch_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notice_queue_batches WHERE id = $1")
            .bind(batch_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

fn build_entries(user_ids: &[Uuid], request: &NoticeRequest) -> Vec<QueuedNotice> {
    user_ids
        .iter()
        .map(|&user_id| QueuedNotice {
            user_id,
            request: request.clone(),
        })
        .collect()
}

/// Decode a stored batch payload.
pub fn decode_batch(batch: &NoticeQueueBatch) -> Result<Vec<QueuedNotice>, serde_json::Error> {
    serde_json::from_value(batch.payload.clone())
}
