use crate::domain::{models::post::Post, ports::PostRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresPostRepo {
    pool: PgPool,
}

impl PostgresPostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepo {
    async fn create(&self, post: &Post) -> Result<Post, AppError> {
        sqlx::query_as::<_, Post>(
            "INSERT INTO artist_posts (id, owner_user_id, kind, caption, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING id, owner_user_id, kind, caption, created_at",
        )
            .bind(&post.id)
            .bind(&post.owner_user_id)
            .bind(post.kind.as_str())
            .bind(&post.caption)
            .bind(post.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        sqlx::query_as::<_, Post>(
            "SELECT id, owner_user_id, kind, caption, created_at FROM artist_posts WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn add_reaction(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO post_reactions (id, post_id, user_id, created_at) VALUES ($1, $2, $3, $4) ON CONFLICT (post_id, user_id) DO NOTHING"
        )
            .bind(Uuid::new_v4().to_string())
            .bind(post_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn add_comment(&self, post_id: &str, user_id: &str, text: &str) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO post_comments (id, post_id, user_id, body, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(&id)
            .bind(post_id)
            .bind(user_id)
            .bind(text)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(id)
    }
}
