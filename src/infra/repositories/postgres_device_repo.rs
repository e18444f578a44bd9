use crate::domain::{models::device::Device, ports::DeviceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresDeviceRepo {
    pool: PgPool,
}

impl PostgresDeviceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepo {
    async fn register(&self, device: &Device) -> Result<Device, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Most recent registration wins; older installs are kept but retired.
        sqlx::query("UPDATE devices SET is_active = FALSE WHERE user_id = $1 AND device_id <> $2")
            .bind(&device.user_id)
            .bind(&device.device_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let registered = sqlx::query_as::<_, Device>(
            "INSERT INTO devices (id, user_id, device_id, push_token, is_active, updated_at) VALUES ($1, $2, $3, $4, TRUE, $5)
             ON CONFLICT (user_id, device_id) DO UPDATE SET push_token = excluded.push_token, is_active = TRUE, updated_at = excluded.updated_at
             RETURNING id, user_id, device_id, push_token, is_active, updated_at"
        )
            .bind(&device.id)
            .bind(&device.user_id)
            .bind(&device.device_id)
            .bind(&device.push_token)
            .bind(device.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(registered)
    }

    async fn active_devices(&self, user_id: &str) -> Result<Vec<Device>, AppError> {
        sqlx::query_as::<_, Device>(
            "SELECT id, user_id, device_id, push_token, is_active, updated_at FROM devices WHERE user_id = $1 AND is_active = TRUE ORDER BY updated_at DESC"
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn deactivate(&self, push_token: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE devices SET is_active = FALSE WHERE push_token = $1")
            .bind(push_token)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
