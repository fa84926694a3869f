use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery channel a notice can be sent over.
///
/// The set is fixed; columns of the settings matrix follow [`NoticeMedium::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeMedium {
    Email,
    Site,
}

impl NoticeMedium {
    /// Every medium, in settings-column order.
    pub const ALL: [NoticeMedium; 2] = [NoticeMedium::Email, NoticeMedium::Site];

    /// Stable identifier used in storage and form field names.
    pub fn id(&self) -> &'static str {
        match self {
            NoticeMedium::Email => "email",
            NoticeMedium::Site => "site",
        }
    }

    /// Human-readable column header.
    pub fn display(&self) -> &'static str {
        match self {
            NoticeMedium::Email => "Email",
            NoticeMedium::Site => "Site",
        }
    }

    /// A setting defaults to on when this is <= the notice type's default sensitivity.
    pub fn sensitivity(&self) -> i32 {
        match self {
            NoticeMedium::Email => 2,
            NoticeMedium::Site => 1,
        }
    }

    /// Default `send` value for a notice type whose default sensitivity is given.
    pub fn default_send(&self, type_default: i32) -> bool {
        self.sensitivity() <= type_default
    }
}

impl std::fmt::Display for NoticeMedium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for NoticeMedium {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoticeMedium::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| format!("Unknown notice medium '{}'", s))
    }
}

/// A user in the system.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A labeled category of notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoticeType {
    pub id: Uuid,
    /// Unique machine label, e.g. `friends_invite`.
    pub label: String,
    /// Display name shown as the settings row header.
    pub display: String,
    pub description: String,
    /// Media with a sensitivity at or below this value are on by default.
    pub default_sensitivity: i32,
}

/// A user's stored preference for one notice type over one medium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoticeSetting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notice_type_id: Uuid,
    pub medium: NoticeMedium,
    pub send: bool,
}

/// A single notice delivered to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notice {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub notice_type_id: Uuid,
    pub message: String,
    pub added: DateTime<Utc>,
    pub unseen: bool,
    pub archived: bool,
    pub on_site: bool,
}

/// A batch of notices waiting for the emission job.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoticeQueueBatch {
    pub id: Uuid,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
