//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use vault_core::{BotUser, ChatId, DomainError, RepoResult, UserRepository};

use crate::models::BotUserModel;

use super::error::map_db_error;

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn touch(&self, id: ChatId, now: DateTime<Utc>) -> RepoResult<BotUser> {
        let model = sqlx::query_as::<_, BotUserModel>(
            r#"
            INSERT INTO bot_users (id, first_seen, last_active, files_received)
            VALUES ($1, $2, $2, 0)
            ON CONFLICT (id)
            DO UPDATE SET last_active = GREATEST(bot_users.last_active, EXCLUDED.last_active)
            RETURNING id, first_seen, last_active, files_received
            "#,
        )
        .bind(id.into_inner())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(BotUser::from(model))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ChatId) -> RepoResult<Option<BotUser>> {
        let result = sqlx::query_as::<_, BotUserModel>(
            r#"
            SELECT id, first_seen, last_active, files_received
            FROM bot_users
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(BotUser::from))
    }

    #[instrument(skip(self))]
    async fn add_files_received(&self, id: ChatId, count: i64) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bot_users
            SET files_received = files_received + $2
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(count.max(0))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> RepoResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bot_users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count.0)
    }
}
