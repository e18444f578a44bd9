use crate::domain::{models::notification::{Notification, NotificationKind}, ports::NotificationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const NOTIFICATION_COLUMNS: &str = "id, from_user_id, to_user_id, title, message, payload, kind, is_read, post_id, conversation_id, is_bundled, is_summary, bundled_into_id, dedupe_key, created_at";

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepo {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {NOTIFICATION_COLUMNS}"
        ))
            .bind(&notification.id)
            .bind(&notification.from_user_id)
            .bind(&notification.to_user_id)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(&notification.payload)
            .bind(notification.kind.as_str())
            .bind(notification.is_read)
            .bind(&notification.post_id)
            .bind(&notification.conversation_id)
            .bind(notification.is_bundled)
            .bind(notification.is_summary)
            .bind(&notification.bundled_into_id)
            .bind(&notification.dedupe_key)
            .bind(notification.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(&format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn exists_by_dedupe_key(&self, dedupe_key: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE dedupe_key = ?")
            .bind(dedupe_key)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count > 0)
    }

    async fn count_unbundled_since(&self, to_user_id: &str, post_id: &str, kind: NotificationKind, since: DateTime<Utc>) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications
             WHERE to_user_id = ? AND post_id = ? AND kind = ?
             AND is_bundled = FALSE AND is_summary = FALSE AND created_at >= ?"
        )
            .bind(to_user_id)
            .bind(post_id)
            .bind(kind.as_str())
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn has_summary_since(&self, to_user_id: &str, post_id: &str, since: DateTime<Utc>) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications
             WHERE to_user_id = ? AND post_id = ?
             AND is_summary = TRUE AND created_at >= ?"
        )
            .bind(to_user_id)
            .bind(post_id)
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count > 0)
    }

    async fn list_unbundled_since(&self, to_user_id: &str, post_id: &str, since: DateTime<Utc>) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE to_user_id = ? AND post_id = ? AND kind IN ('REACTION', 'COMMENT')
             AND is_bundled = FALSE AND is_summary = FALSE AND created_at >= ?
             ORDER BY created_at ASC"
        ))
            .bind(to_user_id)
            .bind(post_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn bundle(&self, summary: &Notification, original_ids: &[String]) -> Result<Option<Notification>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {NOTIFICATION_COLUMNS}"
        ))
            .bind(&summary.id).bind(&summary.from_user_id).bind(&summary.to_user_id)
            .bind(&summary.title).bind(&summary.message).bind(&summary.payload)
            .bind(summary.kind.as_str()).bind(summary.is_read).bind(&summary.post_id)
            .bind(&summary.conversation_id).bind(summary.is_bundled).bind(summary.is_summary)
            .bind(&summary.bundled_into_id).bind(&summary.dedupe_key).bind(summary.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let mut bundled = 0;
        for id in original_ids {
            let result = sqlx::query(
                "UPDATE notifications SET is_bundled = TRUE, bundled_into_id = ?
                 WHERE id = ? AND is_bundled = FALSE AND is_summary = FALSE"
            )
                .bind(&created.id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            bundled += result.rows_affected();
        }

        if bundled == 0 {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(created))
    }

    async fn list_for_user(&self, to_user_id: &str, limit: i64) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE to_user_id = ? ORDER BY created_at DESC LIMIT ?"
        ))
            .bind(to_user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
