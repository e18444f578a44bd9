use crate::domain::{models::outbox::OutboxEntry, ports::OutboxRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const OUTBOX_COLUMNS: &str = "id, event_type, payload, status, attempts, error_message, claimed_at, created_at";

pub struct SqliteOutboxRepo {
    pool: SqlitePool,
}

impl SqliteOutboxRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for SqliteOutboxRepo {
    async fn enqueue(&self, entry: &OutboxEntry) -> Result<OutboxEntry, AppError> {
        sqlx::query_as::<_, OutboxEntry>(&format!(
            "INSERT INTO event_outbox ({OUTBOX_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {OUTBOX_COLUMNS}"
        ))
            .bind(&entry.id)
            .bind(&entry.event_type)
            .bind(&entry.payload)
            .bind(entry.status.as_str())
            .bind(entry.attempts)
            .bind(&entry.error_message)
            .bind(entry.claimed_at)
            .bind(entry.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<OutboxEntry>, AppError> {
        sqlx::query_as::<_, OutboxEntry>(&format!("SELECT {OUTBOX_COLUMNS} FROM event_outbox WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn claim_pending(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<OutboxEntry>, AppError> {
        let mut claimed = sqlx::query_as::<_, OutboxEntry>(&format!(
            "UPDATE event_outbox SET status = 'PROCESSING', claimed_at = ?, attempts = attempts + 1
             WHERE id IN (SELECT id FROM event_outbox WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT ?)
             RETURNING {OUTBOX_COLUMNS}"
        ))
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        // RETURNING order is unspecified.
        claimed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(claimed)
    }

    async fn complete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE event_outbox SET status = 'COMPLETED', error_message = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn fail(&self, id: &str, error_message: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE event_outbox SET status = 'FAILED', error_message = ? WHERE id = ?")
            .bind(error_message)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn release(&self, id: &str, error_message: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE event_outbox SET status = 'PENDING', claimed_at = NULL, error_message = ? WHERE id = ? AND status = 'PROCESSING'")
            .bind(error_message)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn release_stale_claims(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE event_outbox SET status = 'PENDING', claimed_at = NULL
             WHERE status = 'PROCESSING' AND claimed_at < ?"
        )
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
