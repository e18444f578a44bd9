use crate::domain::{models::invite::{InviteRecord, InviteStatus}, ports::InviteRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const INVITE_COLUMNS: &str = "id, user_id, artist_post_id, artist_id, valid_until, status, created_at";

pub struct SqliteInviteRepo {
    pool: SqlitePool,
}

impl SqliteInviteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for SqliteInviteRepo {
    async fn create(&self, invite: &InviteRecord) -> Result<InviteRecord, AppError> {
        sqlx::query_as::<_, InviteRecord>(&format!(
            "INSERT INTO invite_records ({INVITE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {INVITE_COLUMNS}"
        ))
            .bind(&invite.id)
            .bind(&invite.user_id)
            .bind(&invite.artist_post_id)
            .bind(&invite.artist_id)
            .bind(invite.valid_until)
            .bind(invite.status.as_str())
            .bind(invite.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<InviteRecord>, AppError> {
        sqlx::query_as::<_, InviteRecord>(&format!("SELECT {INVITE_COLUMNS} FROM invite_records WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_for_user_and_post(&self, user_id: &str, post_id: &str) -> Result<Option<InviteRecord>, AppError> {
        sqlx::query_as::<_, InviteRecord>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invite_records WHERE user_id = ? AND artist_post_id = ?"
        ))
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_generic_relationship(&self, user_id: &str, artist_id: &str) -> Result<Option<InviteRecord>, AppError> {
        sqlx::query_as::<_, InviteRecord>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invite_records WHERE user_id = ? AND artist_id = ? AND status = 'GENERIC' ORDER BY created_at ASC LIMIT 1"
        ))
            .bind(user_id)
            .bind(artist_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_generic_fans(&self, artist_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT user_id FROM invite_records WHERE artist_id = ? AND status = 'GENERIC'"
        )
            .bind(artist_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_users_with_post_access(&self, post_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT user_id FROM invite_records WHERE artist_post_id = ? AND status IN ('ACCEPTED', 'GENERIC')"
        )
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn transition(&self, id: &str, user_id: &str, next: InviteStatus) -> Result<Option<InviteRecord>, AppError> {
        sqlx::query_as::<_, InviteRecord>(&format!(
            "UPDATE invite_records SET status = ? WHERE id = ? AND user_id = ? AND status = 'PENDING' RETURNING {INVITE_COLUMNS}"
        ))
            .bind(next.as_str())
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM invite_records WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invite not found".into()));
        }
        Ok(())
    }

    async fn purge_stale(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let result = sqlx::query(
            "DELETE FROM invite_records
             WHERE status <> 'ACCEPTED'
             AND (status = 'REJECTED' OR (valid_until IS NOT NULL AND valid_until < ?))"
        )
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
