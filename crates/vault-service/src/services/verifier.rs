//! Subscription verifier
//!
//! Produces one gating decision per retrieval. Every required channel is
//! checked in configured order and every miss is collected, so the caller can
//! render a single combined join prompt.

use chrono::Utc;
use tracing::{debug, instrument};

use vault_core::{
    ChannelRequirement, ChatId, GatingDecision, MissingChannel, SubscriptionRecord,
    SubscriptionStatus,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::retry::retry_with_backoff;

/// Subscription verifier
pub struct SubscriptionVerifier<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SubscriptionVerifier<'a> {
    /// Create a new SubscriptionVerifier
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Check the user against every required channel
    ///
    /// # Errors
    /// Returns `PlatformUnavailable` when a live membership check keeps failing.
    #[instrument(skip(self))]
    pub async fn verify(&self, user_id: ChatId) -> ServiceResult<GatingDecision> {
        let mut missing = Vec::new();

        for requirement in &self.ctx.config().required_channels {
            let status = self.channel_status(user_id, requirement).await?;
            if !status.is_member() {
                missing.push(MissingChannel::new(requirement, status));
            }
        }

        let decision = GatingDecision::from_missing(missing);
        debug!(
            user_id = %user_id,
            granted = decision.is_granted(),
            missing = ?decision.missing_ids(),
            "Gating decision"
        );
        Ok(decision)
    }

    /// Status of one (user, channel) pair, cache first
    async fn channel_status(
        &self,
        user_id: ChatId,
        requirement: &ChannelRequirement,
    ) -> ServiceResult<SubscriptionStatus> {
        let channel_id = requirement.channel_id;
        let cache = self.ctx.subscription_cache();

        if cache.get(user_id, channel_id) == Some(SubscriptionStatus::Member) {
            return Ok(SubscriptionStatus::Member);
        }

        // Serialize with join-request events for the same pair
        let _guard = self
            .ctx
            .subscription_locks()
            .lock((user_id, channel_id))
            .await;

        // An approval may have landed while we waited
        if cache.get(user_id, channel_id) == Some(SubscriptionStatus::Member) {
            return Ok(SubscriptionStatus::Member);
        }

        let platform = self.ctx.platform();
        let member_status = retry_with_backoff(&self.ctx.config().retry, "check_membership", || {
            platform.check_membership(channel_id, user_id)
        })
        .await
        .map_err(ServiceError::PlatformUnavailable)?;

        let status = if member_status.is_joined() {
            SubscriptionStatus::Member
        } else if requirement.mode.is_request_gated() && self.has_pending_request(user_id, channel_id).await? {
            SubscriptionStatus::Pending
        } else {
            SubscriptionStatus::NotMember
        };

        cache.put(SubscriptionRecord::new(user_id, channel_id, status, Utc::now()));
        debug!(
            user_id = %user_id,
            channel_id = %channel_id,
            ?member_status,
            ?status,
            "Live membership check"
        );

        Ok(status)
    }

    async fn has_pending_request(&self, user_id: ChatId, channel_id: ChatId) -> ServiceResult<bool> {
        Ok(self
            .ctx
            .join_request_repo()
            .find(user_id, channel_id)
            .await?
            .is_some_and(|request| request.is_pending()))
    }
}
