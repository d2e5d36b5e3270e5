//! PostgreSQL implementation of DeliveryRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use vault_core::{ChatId, DeliveryRecord, DeliveryRepository, MessageId, RepoResult};

use crate::mappers::DeliveryInsert;
use crate::models::DeliveryModel;

use super::error::map_db_error;

/// PostgreSQL implementation of DeliveryRepository
#[derive(Clone)]
pub struct PgDeliveryRepository {
    pool: PgPool,
}

impl PgDeliveryRepository {
    /// Create a new PgDeliveryRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRepository for PgDeliveryRepository {
    #[instrument(skip(self))]
    async fn insert(&self, record: &DeliveryRecord) -> RepoResult<()> {
        let insert = DeliveryInsert::new(record);

        sqlx::query(
            r#"
            INSERT INTO delivery_queue (chat_id, message_id, delivered_at, delete_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (chat_id, message_id)
            DO UPDATE SET delivered_at = EXCLUDED.delivered_at, delete_at = EXCLUDED.delete_at
            "#,
        )
        .bind(insert.chat_id)
        .bind(insert.message_id)
        .bind(insert.delivered_at)
        .bind(insert.delete_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, chat_id: ChatId, message_id: MessageId) -> RepoResult<()> {
        sqlx::query(
            r#"
            DELETE FROM delivery_queue
            WHERE chat_id = $1 AND message_id = $2
            "#,
        )
        .bind(chat_id.into_inner())
        .bind(message_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_pending(&self) -> RepoResult<Vec<DeliveryRecord>> {
        let results = sqlx::query_as::<_, DeliveryModel>(
            r#"
            SELECT chat_id, message_id, delivered_at, delete_at
            FROM delivery_queue
            ORDER BY delete_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(DeliveryRecord::from).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> RepoResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM delivery_queue")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count.0)
    }
}
