//! Token service - issue and resolve access tokens

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument};

use vault_core::{AccessToken, ArchiveFileRef, ChatId, DomainError, MessageId, TokenUsage};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Attempts at drawing an unused token before giving up
const MAX_GENERATION_ATTEMPTS: usize = 3;

/// Token service
pub struct TokenService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TokenService<'a> {
    /// Create a new TokenService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a token for an ordered list of archive messages
    ///
    /// `expires_in` overrides the configured default link lifetime.
    #[instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn create(
        &self,
        files: Vec<ArchiveFileRef>,
        expires_in: Option<Duration>,
        created_by: Option<ChatId>,
    ) -> ServiceResult<AccessToken> {
        let max = self.ctx.config().max_batch_size;
        if files.len() > max {
            return Err(DomainError::BatchTooLarge { max }.into());
        }

        let ttl = expires_in.or(self.ctx.config().link_expiry);

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let mut token = AccessToken::issue(files.clone())?;
            if let Some(ttl) = ttl {
                let ttl = chrono::Duration::from_std(ttl)
                    .map_err(|_| ServiceError::validation("expiry is out of range"))?;
                token = token.with_expiration(ttl);
            }
            if let Some(creator) = created_by {
                token = token.with_creator(creator);
            }

            match self.ctx.token_repo().create(&token).await {
                Ok(()) => {
                    info!(
                        token = %token.token,
                        file_count = token.file_count(),
                        expires_at = ?token.expires_at,
                        "Token issued"
                    );
                    return Ok(token);
                }
                Err(DomainError::TokenExists) => {
                    debug!(attempt, "Token collision, drawing again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::internal("could not generate a unique token"))
    }

    /// Issue a token for a contiguous range of archive messages
    ///
    /// Reversed bounds are swapped. Both ends are inclusive.
    #[instrument(skip(self))]
    pub async fn create_range(
        &self,
        first_message_id: MessageId,
        last_message_id: MessageId,
        expires_in: Option<Duration>,
        created_by: Option<ChatId>,
    ) -> ServiceResult<AccessToken> {
        if first_message_id <= 0 || last_message_id <= 0 {
            return Err(ServiceError::validation("message ids must be positive"));
        }

        let (start, end) = if first_message_id <= last_message_id {
            (first_message_id, last_message_id)
        } else {
            (last_message_id, first_message_id)
        };

        let max = self.ctx.config().max_batch_size;
        let span = usize::try_from(end - start + 1).unwrap_or(usize::MAX);
        if span > max {
            return Err(DomainError::BatchTooLarge { max }.into());
        }

        let archive = self.ctx.config().archive_channel;
        let files = (start..=end)
            .map(|message_id| ArchiveFileRef::new(archive, message_id))
            .collect();

        self.create(files, expires_in, created_by).await
    }

    /// Files behind a token, checked against the current wall clock
    ///
    /// Never mutates storage, so resolving the same token twice yields the
    /// same files.
    pub async fn resolve(&self, token: &str) -> ServiceResult<Vec<ArchiveFileRef>> {
        self.resolve_at(token, Utc::now()).await
    }

    /// Same as [`resolve`](Self::resolve) evaluated at `now`
    #[instrument(skip(self, token))]
    pub async fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<ArchiveFileRef>> {
        let stored = self.find(token).await?;
        if stored.is_expired_at(now) {
            debug!(expires_at = ?stored.expires_at, "Token expired");
            return Err(DomainError::TokenExpired.into());
        }
        Ok(stored.files)
    }

    /// Look up a token without evaluating expiry
    pub async fn find(&self, token: &str) -> ServiceResult<AccessToken> {
        if !AccessToken::is_well_formed(token) {
            return Err(DomainError::TokenNotFound.into());
        }

        self.ctx
            .token_repo()
            .find_by_token(token)
            .await?
            .ok_or_else(|| DomainError::TokenNotFound.into())
    }

    /// How often the token has delivered files
    pub async fn usage(&self, token: &str) -> ServiceResult<TokenUsage> {
        Ok(self.ctx.token_repo().usage(token).await?)
    }

    /// Deep link that opens the bot with this token
    pub fn link(&self, token: &AccessToken) -> String {
        token.deep_link(&self.ctx.config().bot_username)
    }
}
