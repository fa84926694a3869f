//! One-time flash messages, stored per user in a Redis list.
//!
//! Messages are pushed by an action (e.g. saving settings) and drained by the
//! next page a user loads. Unread messages expire after [`FLASH_TTL_SECONDS`].

use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herald_common::error::AppError;

/// Unread flash messages are dropped after a day.
const FLASH_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            text: text.into(),
        }
    }
}

/// Redis-backed flash message store.
pub struct FlashStore;

impl FlashStore {
    fn key(user_id: Uuid) -> String {
        format!("flash:{}", user_id)
    }

    /// Queue a message for the user's next page load.
    pub async fn push(
        redis: &mut ConnectionManager,
        user_id: Uuid,
        message: &FlashMessage,
    ) -> Result<(), AppError> {
        let key = Self::key(user_id);
        let encoded = serde_json::to_string(message)
            .map_err(|e| AppError::Internal(format!("Failed to encode flash message: {}", e)))?;

        let _: () = redis::pipe()
            .atomic()
            .rpush(&key, encoded)
            .ignore()
            .expire(&key, FLASH_TTL_SECONDS)
            .ignore()
            .query_async(redis)
            .await?;

        Ok(())
    }

    /// Return and clear every pending message, oldest first.
    pub async fn take(
        redis: &mut ConnectionManager,
        user_id: Uuid,
    ) -> Result<Vec<FlashMessage>, AppError> {
        let key = Self::key(user_id);

        let (raw, _): (Vec<String>, i64) = redis::pipe()
            .atomic()
            .lrange(&key, 0, -1)
            .del(&key)
            .query_async(redis)
            .await?;

        Ok(decode_all(raw))
    }
}

/// Decode stored messages, skipping entries that are not valid JSON.
fn decode_all(raw: Vec<String>) -> Vec<FlashMessage> {
    raw.into_iter()
        .filter_map(|entry| match serde_json::from_str(&entry) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed flash message");
                None
            }
        })
        .collect()
}
