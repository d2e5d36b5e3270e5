//! Retrieval pipeline
//!
//! One run per opened link:
//!
//! ```text
//! Received -> Verifying -> Denied
//!                       -> Resolving -> Delivering -> Scheduled
//!                                                  -> DeliveryFailed
//! ```
//!
//! Files are copied in token order, each with its own bounded retry. A file
//! that still fails is skipped, so the user may receive a partial batch.
//! When the caller cancels, the run stops at the next checkpoint and no
//! deletion is scheduled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use vault_core::{
    deep_link, ArchiveFileRef, ChatId, DeliveryRecord, DomainError, GatingDecision, MessageId,
    MissingChannel, StatEvent,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::notices;
use super::retry::retry_with_backoff;
use super::tokens::TokenService;
use super::verifier::SubscriptionVerifier;

/// Pipeline states, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalState {
    Received,
    Verifying,
    Denied,
    Resolving,
    Delivering,
    Scheduled,
    DeliveryFailed,
}

/// What happened to the requested files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliverySummary {
    pub requested: usize,
    pub delivered: usize,
    /// IDs of the copies in the user's chat, in token order
    pub message_ids: Vec<MessageId>,
    /// Files skipped after retries ran out
    pub failed: Vec<ArchiveFileRef>,
    /// When the copies will be removed, if auto-delete is on
    pub delete_at: Option<DateTime<Utc>>,
}

/// Terminal result of a retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    /// Required channels not joined, in configured order
    Denied { missing: Vec<MissingChannel> },
    /// Token unknown or malformed
    InvalidLink,
    ExpiredLink,
    /// At least one file arrived
    Delivered { summary: DeliverySummary },
    /// Every file failed after retries
    DeliveryFailed { summary: DeliverySummary },
}

impl RetrievalOutcome {
    pub fn state(&self) -> RetrievalState {
        match self {
            Self::Denied { .. } => RetrievalState::Denied,
            Self::InvalidLink | Self::ExpiredLink => RetrievalState::Resolving,
            Self::Delivered { .. } => RetrievalState::Scheduled,
            Self::DeliveryFailed { .. } => RetrievalState::DeliveryFailed,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn summary(&self) -> Option<&DeliverySummary> {
        match self {
            Self::Delivered { summary } | Self::DeliveryFailed { summary } => Some(summary),
            _ => None,
        }
    }
}

/// Retrieval pipeline
pub struct RetrievalPipeline<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RetrievalPipeline<'a> {
    /// Create a new RetrievalPipeline
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run the pipeline for `user_id` opening `token`
    ///
    /// # Errors
    /// - `PlatformUnavailable` when membership cannot be checked
    /// - `Cancelled` when `cancel` fires before the run completes
    /// - storage errors from the repositories
    #[instrument(
        skip(self, token, cancel),
        fields(request_id = %Uuid::new_v4(), user_id = %user_id)
    )]
    pub async fn run(
        &self,
        user_id: ChatId,
        token: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult<RetrievalOutcome> {
        enter(RetrievalState::Received);
        self.ctx.stats().record(StatEvent::RetrievalRequested);
        self.ctx.user_repo().touch(user_id, Utc::now()).await?;

        enter(RetrievalState::Verifying);
        let decision = SubscriptionVerifier::new(self.ctx).verify(user_id).await?;
        ensure_active(cancel)?;

        if let GatingDecision::Denied { missing } = decision {
            enter(RetrievalState::Denied);
            self.ctx.stats().record(StatEvent::AccessDenied);
            info!(missing = missing.len(), "Access denied");

            let retry_link = self.retry_link(token);
            self.notify(user_id, &notices::join_prompt(&missing, retry_link.as_deref()))
                .await;
            return Ok(RetrievalOutcome::Denied { missing });
        }

        enter(RetrievalState::Resolving);
        let files = match TokenService::new(self.ctx).resolve(token).await {
            Ok(files) => files,
            Err(ServiceError::Domain(DomainError::TokenNotFound)) => {
                self.ctx.stats().record(StatEvent::InvalidLink);
                self.notify(user_id, notices::invalid_link()).await;
                return Ok(RetrievalOutcome::InvalidLink);
            }
            Err(ServiceError::Domain(DomainError::TokenExpired)) => {
                self.ctx.stats().record(StatEvent::ExpiredLink);
                self.notify(user_id, notices::expired_link()).await;
                return Ok(RetrievalOutcome::ExpiredLink);
            }
            Err(e) => return Err(e),
        };
        ensure_active(cancel)?;

        enter(RetrievalState::Delivering);
        let mut summary = self.deliver(user_id, &files, cancel).await?;

        if summary.delivered == 0 {
            enter(RetrievalState::DeliveryFailed);
            warn!(requested = summary.requested, "No file could be delivered");
            self.notify(user_id, notices::delivery_failed()).await;
            return Ok(RetrievalOutcome::DeliveryFailed { summary });
        }

        ensure_active(cancel)?;
        summary.delete_at = self.schedule_deletions(user_id, &summary.message_ids).await;
        enter(RetrievalState::Scheduled);

        self.ctx
            .stats()
            .record_many(StatEvent::FileDelivered, summary.delivered as u64);
        if let Err(e) = self
            .ctx
            .user_repo()
            .add_files_received(user_id, summary.delivered as i64)
            .await
        {
            warn!(error = %e, "Failed to update delivered-files counter");
        }
        if let Err(e) = self.ctx.token_repo().record_access(token, Utc::now()).await {
            warn!(error = %e, "Failed to update token access counter");
        }

        info!(
            delivered = summary.delivered,
            requested = summary.requested,
            "Files delivered"
        );
        if let Some(text) = notices::delivery_summary(
            summary.delivered,
            summary.requested,
            self.ctx.config().auto_delete,
        ) {
            self.notify(user_id, &text).await;
        }

        Ok(RetrievalOutcome::Delivered { summary })
    }

    /// Copy each file in order, skipping the ones that keep failing
    async fn deliver(
        &self,
        user_id: ChatId,
        files: &[ArchiveFileRef],
        cancel: &CancellationToken,
    ) -> ServiceResult<DeliverySummary> {
        let config = self.ctx.config();
        let platform = self.ctx.platform();
        let mut message_ids = Vec::with_capacity(files.len());
        let mut failed = Vec::new();

        for &file in files {
            ensure_active(cancel)?;

            let copied = retry_with_backoff(&config.retry, "copy_message", || {
                platform.copy_message(file, user_id, config.protect_content)
            })
            .await;

            match copied {
                Ok(message_id) => {
                    debug!(source = file.message_id, message_id, "File delivered");
                    message_ids.push(message_id);
                }
                Err(e) => {
                    self.ctx.stats().record(StatEvent::DeliveryFailed);
                    warn!(source = file.message_id, error = %e, "Skipping file");
                    failed.push(file);
                }
            }
        }

        Ok(DeliverySummary {
            requested: files.len(),
            delivered: message_ids.len(),
            message_ids,
            failed,
            delete_at: None,
        })
    }

    /// Queue removal of every delivered copy. Returns the shared deadline.
    ///
    /// The files are already in the user's chat, so a record that cannot be
    /// stored is logged and skipped rather than failing the run.
    async fn schedule_deletions(
        &self,
        user_id: ChatId,
        message_ids: &[MessageId],
    ) -> Option<DateTime<Utc>> {
        let ttl = self.ctx.config().auto_delete?;
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            warn!(?ttl, "Auto-delete time is out of range, copies will be kept");
            return None;
        };

        let delivered_at = Utc::now();
        let mut scheduled = 0;
        for &message_id in message_ids {
            let record = DeliveryRecord::new(user_id, message_id, delivered_at, ttl);
            match self.ctx.scheduler().schedule(record).await {
                Ok(()) => scheduled += 1,
                Err(e) => {
                    self.ctx.stats().record(StatEvent::DeletionFailed);
                    warn!(message_id, error = %e, "Failed to schedule deletion");
                }
            }
        }
        (scheduled > 0).then(|| delivered_at + ttl)
    }

    fn retry_link(&self, token: &str) -> Option<String> {
        let bot_username = &self.ctx.config().bot_username;
        (!bot_username.is_empty()).then(|| deep_link(bot_username, token))
    }

    /// Best-effort message to the user
    async fn notify(&self, user_id: ChatId, text: &str) {
        let platform = self.ctx.platform();
        let sent = retry_with_backoff(&self.ctx.config().retry, "send_message", || {
            platform.send_message(user_id, text)
        })
        .await;
        if let Err(e) = sent {
            warn!(error = %e, "Failed to notify user");
        }
    }
}

fn enter(state: RetrievalState) {
    debug!(?state, "Retrieval state");
}

fn ensure_active(cancel: &CancellationToken) -> ServiceResult<()> {
    if cancel.is_cancelled() {
        debug!("Retrieval cancelled, discarding results");
        return Err(ServiceError::Cancelled);
    }
    Ok(())
}
