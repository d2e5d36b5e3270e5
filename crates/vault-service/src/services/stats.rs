//! Stats service - usage snapshot for operators

use tracing::instrument;

use crate::dto::StatsResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Stats service
pub struct StatsService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatsService<'a> {
    /// Create a new StatsService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current totals and counters
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> ServiceResult<StatsResponse> {
        let users = self.ctx.user_repo().count().await?;
        let tokens = self.ctx.token_repo().count().await?;
        let token_accesses = self.ctx.token_repo().total_accesses().await?;
        let pending_deletions = self.ctx.delivery_repo().count().await?;

        Ok(StatsResponse::new(
            users,
            tokens,
            token_accesses,
            pending_deletions,
            self.ctx.subscription_cache().len(),
            self.ctx.stats().snapshot(),
        ))
    }
}
