//! Delivery backends for off-site media.
//!
//! Site delivery is the notice row itself; every other medium is handed to a
//! [`DeliveryBackend`] registered for it.

use async_trait::async_trait;

use herald_common::types::{Notice, NoticeMedium, NoticeType, User};

/// Everything a backend needs to deliver one notice to one user.
#[derive(Debug, Clone)]
pub struct Delivery<'a> {
    pub recipient: &'a User,
    pub notice_type: &'a NoticeType,
    pub notice: &'a Notice,
    pub subject: String,
}

impl<'a> Delivery<'a> {
    pub fn new(recipient: &'a User, notice_type: &'a NoticeType, notice: &'a Notice) -> Self {
        Self {
            recipient,
            notice_type,
            notice,
            subject: notice_type.display.clone(),
        }
    }
}

/// A transport for one medium.
#[async_trait]
pub trait DeliveryBackend: Send + Sync {
    fn medium(&self) -> NoticeMedium;

    async fn deliver(&self, delivery: &Delivery<'_>) -> anyhow::Result<()>;
}

/// Backend that records deliveries in the log instead of sending them.
pub struct LogBackend {
    medium: NoticeMedium,
}

impl LogBackend {
    pub fn new(medium: NoticeMedium) -> Self {
        Self { medium }
    }
}

#[async_trait]
impl DeliveryBackend for LogBackend {
    fn medium(&self) -> NoticeMedium {
        self.medium
    }

    async fn deliver(&self, delivery: &Delivery<'_>) -> anyhow::Result<()> {
        let address = delivery.recipient.email.as_deref().unwrap_or_default();
        tracing::info!(
            medium = %self.medium,
            notice_id = %delivery.notice.id,
            recipient = %delivery.recipient.username,
            address,
            subject = %delivery.subject,
            label = %delivery.notice_type.label,
            "Notice delivered"
        );
        Ok(())
    }
}
