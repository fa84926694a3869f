//! Notice emission: turns send requests into notice rows and off-site
//! deliveries, either immediately or through the batch queue that the
//! `emit-notices` job drains.

pub mod backend;
pub mod lock;
pub mod queue;
pub mod render;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use redis::aio::ConnectionManager;
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{NoticeMedium, User};
use herald_engine::notice_types::NoticeTypeService;
use herald_engine::notices::{CreateNoticeParams, NoticeService};
use herald_engine::settings::should_send;
use herald_engine::users::UserService;

use crate::backend::{Delivery, DeliveryBackend, LogBackend};
use crate::lock::EmitLock;
use crate::queue::{NoticeQueue, NoticeRequest, QueuedNotice, decode_batch};
use crate::render::render_message;

/// How [`Notifier::send`] should dispatch a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    Now,
    Queue,
    /// Queue when `queue_all` is configured, otherwise send now.
    Default,
}

/// What [`Notifier::send`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(usize),
    Queued(Uuid),
}

/// Summary of one `send_all` run.
#[derive(Debug, Clone, Default)]
pub struct EmitReport {
    pub batches: u32,
    pub sent: u32,
    /// Batches left in place: undecodable, or naming an unknown notice type.
    pub skipped_batches: u32,
    pub elapsed: Duration,
}

/// Sends notices and drains the queue.
#[derive(Clone)]
pub struct Notifier {
    pool: PgPool,
    backends: Vec<Arc<dyn DeliveryBackend>>,
    queue_all: bool,
}

impl Notifier {
    /// A notifier with a logging backend for email.
    pub fn new(pool: PgPool, queue_all: bool) -> Self {
        Self {
            pool,
            backends: vec![Arc::new(LogBackend::new(NoticeMedium::Email))],
            queue_all,
        }
    }

    /// Register a backend, replacing any existing backend for the same medium.
    pub fn with_backend(mut self, backend: Arc<dyn DeliveryBackend>) -> Self {
        self.backends.retain(|b| b.medium() != backend.medium());
        self.backends.push(backend);
        self
    }

    fn backend_for(&self, medium: NoticeMedium) -> Option<&Arc<dyn DeliveryBackend>> {
        self.backends.iter().find(|b| b.medium() == medium)
    }

    /// Dispatch a request according to `mode`.
    pub async fn send(
        &self,
        mode: SendMode,
        users: &[User],
        request: &NoticeRequest,
    ) -> Result<SendOutcome, AppError> {
        let queue = match mode {
            SendMode::Now => false,
            SendMode::Queue => true,
            SendMode::Default => self.queue_all,
        };

        if queue {
            let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
            let batch_id = NoticeQueue::enqueue(&self.pool, &ids, request).await?;
            Ok(SendOutcome::Queued(batch_id))
        } else {
            let sent = self.send_now(users, request).await?;
            Ok(SendOutcome::Sent(sent))
        }
    }

    /// Create a notice for every user and hand off-site copies to backends.
    ///
    /// Returns the number of notices created.
    pub async fn send_now(&self, users: &[User], request: &NoticeRequest) -> Result<usize, AppError> {
        let notice_type = NoticeTypeService::get_by_label(&self.pool, &request.label).await?;
        let message = render_message(&notice_type, &request.extra_context);

        for user in users {
            let on_site = request.on_site
                && should_send(&self.pool, user.id, &notice_type, NoticeMedium::Site).await?;

            let notice = NoticeService::create(
                &self.pool,
                &CreateNoticeParams {
                    recipient_id: user.id,
                    sender_id: request.sender_id,
                    notice_type_id: notice_type.id,
                    message: message.clone(),
                    on_site,
                },
            )
            .await?;

            let has_email = user
                .email
                .as_deref()
                .is_some_and(|email| !email.trim().is_empty());
            if !user.is_active || !has_email {
                continue;
            }

            for medium in NoticeMedium::ALL {
                if medium == NoticeMedium::Site
                    || !should_send(&self.pool, user.id, &notice_type, medium).await?
                {
                    continue;
                }

                let Some(backend) = self.backend_for(medium) else {
                    tracing::debug!(medium = %medium, "No backend registered for medium");
                    continue;
                };

                let delivery = Delivery::new(user, &notice_type, &notice);
                if let Err(e) = backend.deliver(&delivery).await {
                    tracing::warn!(
                        error = %e,
                        medium = %medium,
                        notice_id = %notice.id,
                        "Notice delivery failed"
                    );
                }
            }
        }

        Ok(users.len())
    }

    /// Queue a request for the emission job.
    pub async fn queue(&self, user_ids: &[Uuid], request: &NoticeRequest) -> Result<Uuid, AppError> {
        NoticeQueue::enqueue(&self.pool, user_ids, request).await
    }

    /// Drain every queued batch under the emit lock.
    ///
    /// Returns `None` without doing any work when another run holds the lock.
    pub async fn send_all(
        &self,
        redis: &mut ConnectionManager,
        lock_ttl_secs: u64,
    ) -> anyhow::Result<Option<EmitReport>> {
        let Some(lock) = EmitLock::acquire(redis, lock_ttl_secs).await? else {
            tracing::info!("Emit lock already in place, quitting");
            return Ok(None);
        };

        let result = self.drain_queue().await;

        if let Err(e) = lock.release(redis).await {
            tracing::error!(error = %e, "Failed to release emit lock");
        }

        let report = result?;
        tracing::info!(
            sent = report.sent,
            batches = report.batches,
            skipped_batches = report.skipped_batches,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Queued notices emitted"
        );

        Ok(Some(report))
    }

    async fn drain_queue(&self) -> anyhow::Result<EmitReport> {
        let start = Instant::now();
        let mut report = EmitReport::default();

        for batch in NoticeQueue::pending(&self.pool).await? {
            let entries = match decode_batch(&batch) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(batch_id = %batch.id, error = %e, "Undecodable queue batch");
                    report.skipped_batches += 1;
                    continue;
                }
            };

            if let Some(label) = self.first_unknown_label(&entries).await? {
                tracing::error!(
                    batch_id = %batch.id,
                    label = %label,
                    "Queue batch references an unknown notice type"
                );
                report.skipped_batches += 1;
                continue;
            }

            for entry in entries {
                match UserService::get(&self.pool, entry.user_id).await? {
                    Some(user) => {
                        self.send_now(std::slice::from_ref(&user), &entry.request)
                            .await?;
                    }
                    None => tracing::warn!(
                        user_id = %entry.user_id,
                        label = %entry.request.label,
                        "Skipping queued notice for missing user"
                    ),
                }
                report.sent += 1;
            }

            NoticeQueue::remove(&self.pool, batch.id).await?;
            report.batches += 1;
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }

    /// The first label in `entries` with no matching notice type.
    async fn first_unknown_label(&self, entries: &[QueuedNotice]) -> Result<Option<String>, AppError> {
        let mut checked: HashSet<&str> = HashSet::new();
        for entry in entries {
            let label = entry.request.label.as_str();
            if !checked.insert(label) {
                continue;
            }
            match NoticeTypeService::get_by_label(&self.pool, label).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => return Ok(Some(label.to_string())),
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
