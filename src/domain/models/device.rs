use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A push-capable endpoint for a user.
///
/// `device_id` identifies the physical install, `push_token` is the handle the
/// push transport addresses. Deactivated rows are kept for audit.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub push_token: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub fn new(user_id: String, device_id: String, push_token: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            device_id,
            push_token,
            is_active: true,
            updated_at: Utc::now(),
        }
    }
}
