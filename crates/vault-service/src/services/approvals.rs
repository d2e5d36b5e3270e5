//! Join-request events for request-gated channels
//!
//! The platform notifies us when a user asks to join, and again when the
//! request is approved or declined. Each event is applied under the same
//! per-(user, channel) lock the verifier takes, so an approval can never be
//! overwritten by a verification that started before it.
//!
//! The event timestamp is kept in the ledger only. Cache entries are stamped
//! with the moment the event is applied, so their freshness is bounded by the
//! cache TTL whatever the event claims.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use vault_core::{
    ChatId, DomainError, JoinRequest, JoinResolution, StatEvent, SubscriptionRecord,
    SubscriptionStatus,
};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Join request service
pub struct ApprovalService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ApprovalService<'a> {
    /// Create a new ApprovalService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// A user asked to join a request-gated channel
    #[instrument(skip(self))]
    pub async fn on_join_request(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.ensure_gated(channel_id)?;
        let at = ledger_time(at);
        let _guard = self.ctx.subscription_locks().lock((user_id, channel_id)).await;

        self.ctx
            .join_request_repo()
            .upsert_pending(&JoinRequest::new(user_id, channel_id, at))
            .await?;
        self.ctx.subscription_cache().put(SubscriptionRecord::new(
            user_id,
            channel_id,
            SubscriptionStatus::Pending,
            Utc::now(),
        ));

        info!(user_id = %user_id, channel_id = %channel_id, "Join request recorded");
        Ok(())
    }

    /// The platform approved a join request
    #[instrument(skip(self))]
    pub async fn on_approved(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.ensure_gated(channel_id)?;
        let at = ledger_time(at);
        let _guard = self.ctx.subscription_locks().lock((user_id, channel_id)).await;

        let was_pending = self
            .ctx
            .join_request_repo()
            .resolve(user_id, channel_id, JoinResolution::Approved, at)
            .await?;
        if !was_pending {
            // Approvals may be issued by an admin without a prior request
            warn!(user_id = %user_id, channel_id = %channel_id, "Approval without pending request");
        }

        let applied = self.ctx.subscription_cache().put(SubscriptionRecord::new(
            user_id,
            channel_id,
            SubscriptionStatus::Member,
            Utc::now(),
        ));
        self.ctx.stats().record(StatEvent::JoinRequestApproved);

        info!(
            user_id = %user_id,
            channel_id = %channel_id,
            applied,
            "Join request approved"
        );
        Ok(())
    }

    /// The platform declined a join request
    #[instrument(skip(self))]
    pub async fn on_declined(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.ensure_gated(channel_id)?;
        let at = ledger_time(at);
        let _guard = self.ctx.subscription_locks().lock((user_id, channel_id)).await;

        self.ctx
            .join_request_repo()
            .resolve(user_id, channel_id, JoinResolution::Declined, at)
            .await?;
        self.ctx.subscription_cache().put(SubscriptionRecord::new(
            user_id,
            channel_id,
            SubscriptionStatus::NotMember,
            Utc::now(),
        ));

        info!(user_id = %user_id, channel_id = %channel_id, "Join request declined");
        Ok(())
    }

    /// Only request-gated required channels accept join events
    fn ensure_gated(&self, channel_id: ChatId) -> ServiceResult<()> {
        match self.ctx.config().requirement(channel_id) {
            Some(requirement) if requirement.mode.is_request_gated() => Ok(()),
            Some(_) => Err(DomainError::ChannelNotGated(channel_id).into()),
            None => Err(DomainError::ChannelNotRequired(channel_id).into()),
        }
    }
}

/// Event time for the ledger, never in the future
fn ledger_time(at: DateTime<Utc>) -> DateTime<Utc> {
    at.min(Utc::now())
}
