use crate::domain::models::invite::InviteStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateInviteRequest {
    pub user_id: String,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateInviteRequest {
    pub status: InviteStatus,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct RegisterDeviceRequest {
    pub device_id: String,
    pub push_token: String,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    pub text: String,
}

#[derive(Deserialize)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
}
