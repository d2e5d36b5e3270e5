//! Event service - routes inbound platform events

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use vault_core::{ChatId, PlatformEvent};

use super::approvals::ApprovalService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::retrieval::{RetrievalOutcome, RetrievalPipeline};

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A link was opened and the pipeline ran to completion
    Retrieval(RetrievalOutcome),
    /// A join-request event was applied
    Applied,
}

/// Event service
pub struct EventService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EventService<'a> {
    /// Create a new EventService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, event, cancel), fields(event_type = event.event_type(), user_id = %event.user_id()))]
    pub async fn handle(
        &self,
        event: PlatformEvent,
        cancel: &CancellationToken,
    ) -> ServiceResult<EventOutcome> {
        let approvals = ApprovalService::new(self.ctx);

        match event {
            PlatformEvent::OpenLink(e) => {
                let outcome = RetrievalPipeline::new(self.ctx)
                    .run(e.user_id, &e.token, cancel)
                    .await?;
                info!(state = ?outcome.state(), "Retrieval finished");
                Ok(EventOutcome::Retrieval(outcome))
            }
            PlatformEvent::JoinRequest(e) => {
                approvals
                    .on_join_request(e.user_id, e.channel_id, e.timestamp)
                    .await?;
                self.register(e.user_id).await?;
                Ok(EventOutcome::Applied)
            }
            PlatformEvent::JoinRequestApproved(e) => {
                approvals
                    .on_approved(e.user_id, e.channel_id, e.timestamp)
                    .await?;
                self.register(e.user_id).await?;
                Ok(EventOutcome::Applied)
            }
            PlatformEvent::JoinRequestDeclined(e) => {
                approvals
                    .on_declined(e.user_id, e.channel_id, e.timestamp)
                    .await?;
                self.register(e.user_id).await?;
                Ok(EventOutcome::Applied)
            }
        }
    }

    /// Join-request events also count as activity
    async fn register(&self, user_id: ChatId) -> ServiceResult<()> {
        self.ctx.user_repo().touch(user_id, Utc::now()).await?;
        Ok(())
    }
}
