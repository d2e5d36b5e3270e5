//! PostgreSQL implementation of JoinRequestRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use vault_core::{ChatId, JoinRequest, JoinRequestRepository, JoinResolution, RepoResult};

use crate::mappers::JoinRequestInsert;
use crate::models::JoinRequestModel;

use super::error::map_db_error;

/// PostgreSQL implementation of JoinRequestRepository
#[derive(Clone)]
pub struct PgJoinRequestRepository {
    pool: PgPool,
}

impl PgJoinRequestRepository {
    /// Create a new PgJoinRequestRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JoinRequestRepository for PgJoinRequestRepository {
    #[instrument(skip(self))]
    async fn upsert_pending(&self, request: &JoinRequest) -> RepoResult<()> {
        let insert = JoinRequestInsert::new(request);

        sqlx::query(
            r#"
            INSERT INTO join_requests (user_id, channel_id, requested_at, resolved_at, resolution)
            VALUES ($1, $2, $3, NULL, $4)
            ON CONFLICT (user_id, channel_id)
            DO UPDATE SET requested_at = EXCLUDED.requested_at,
                          resolved_at = NULL,
                          resolution = EXCLUDED.resolution
            "#,
        )
        .bind(insert.user_id)
        .bind(insert.channel_id)
        .bind(insert.requested_at)
        .bind(insert.resolution)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find(&self, user_id: ChatId, channel_id: ChatId) -> RepoResult<Option<JoinRequest>> {
        let result = sqlx::query_as::<_, JoinRequestModel>(
            r#"
            SELECT user_id, channel_id, requested_at, resolved_at, resolution
            FROM join_requests
            WHERE user_id = $1 AND channel_id = $2
            "#,
        )
        .bind(user_id.into_inner())
        .bind(channel_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(JoinRequest::from))
    }

    #[instrument(skip(self))]
    async fn resolve(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        resolution: JoinResolution,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE join_requests
            SET resolution = $3, resolved_at = $4
            WHERE user_id = $1 AND channel_id = $2 AND resolution = 'pending'
            "#,
        )
        .bind(user_id.into_inner())
        .bind(channel_id.into_inner())
        .bind(resolution.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
