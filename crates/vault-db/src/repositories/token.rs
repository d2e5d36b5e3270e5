//! PostgreSQL implementation of TokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use vault_core::{AccessToken, DomainError, RepoResult, TokenRepository, TokenUsage};

use crate::mappers::{access_token_from_rows, TokenFileInsert};
use crate::models::{AccessTokenModel, TokenFileModel, TokenUsageModel};

use super::error::{map_db_error, map_foreign_key_violation, map_unique_violation};

/// PostgreSQL implementation of TokenRepository
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new PgTokenRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    #[instrument(skip(self, token), fields(files = token.files.len()))]
    async fn create(&self, token: &AccessToken) -> RepoResult<()> {
        // Token row and its files land together or not at all
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO access_tokens (token, created_by, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.token)
        .bind(token.created_by.map(vault_core::ChatId::into_inner))
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::TokenExists))?;

        for row in TokenFileInsert::rows(token) {
            sqlx::query(
                r#"
                INSERT INTO access_token_files (token, position, channel_id, message_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.token)
            .bind(row.position)
            .bind(row.channel_id)
            .bind(row.message_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn find_by_token(&self, token: &str) -> RepoResult<Option<AccessToken>> {
        let Some(model) = sqlx::query_as::<_, AccessTokenModel>(
            r#"
            SELECT token, created_by, created_at, expires_at
            FROM access_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        else {
            return Ok(None);
        };

        let files = sqlx::query_as::<_, TokenFileModel>(
            r#"
            SELECT position, channel_id, message_id
            FROM access_token_files
            WHERE token = $1
            ORDER BY position
            "#,
        )
        .bind(token)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Some(access_token_from_rows(model, files)))
    }

    #[instrument(skip(self))]
    async fn count(&self) -> RepoResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM access_tokens")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count.0)
    }

    #[instrument(skip(self, token))]
    async fn record_access(&self, token: &str, at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_token_usage (token, access_count, last_accessed_at)
            VALUES ($1, 1, $2)
            ON CONFLICT (token) DO UPDATE
            SET access_count = access_token_usage.access_count + 1,
                last_accessed_at = GREATEST(access_token_usage.last_accessed_at, EXCLUDED.last_accessed_at)
            "#,
        )
        .bind(token)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, || DomainError::TokenNotFound))?;

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn usage(&self, token: &str) -> RepoResult<TokenUsage> {
        let usage = sqlx::query_as::<_, TokenUsageModel>(
            r#"
            SELECT access_count, last_accessed_at
            FROM access_token_usage
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(usage.map(TokenUsage::from).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn total_accesses(&self) -> RepoResult<i64> {
        let total: (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(access_count), 0)::BIGINT FROM access_token_usage")
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(total.0)
    }
}
