use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Reaction,
    Comment,
    Invite,
    Message,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown notification kind: {0}")]
pub struct UnknownNotificationKind(pub String);

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reaction => "REACTION",
            NotificationKind::Comment => "COMMENT",
            NotificationKind::Invite => "INVITE",
            NotificationKind::Message => "MESSAGE",
        }
    }

    /// Only post interactions collapse into summaries.
    pub fn is_bundleable(&self) -> bool {
        matches!(self, NotificationKind::Reaction | NotificationKind::Comment)
    }

    pub fn verb_phrase(&self) -> &'static str {
        match self {
            NotificationKind::Reaction => "liked your post",
            NotificationKind::Comment => "commented on your post",
            NotificationKind::Invite => "responded to an invite",
            NotificationKind::Message => "sent you a message",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = UnknownNotificationKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "REACTION" => Ok(NotificationKind::Reaction),
            "COMMENT" => Ok(NotificationKind::Comment),
            "INVITE" => Ok(NotificationKind::Invite),
            "MESSAGE" => Ok(NotificationKind::Message),
            _ => Err(UnknownNotificationKind(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Notification {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub title: String,
    pub message: String,
    pub payload: Json<serde_json::Value>,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub post_id: Option<String>,
    pub conversation_id: Option<String>,
    pub is_bundled: bool,
    pub is_summary: bool,
    pub bundled_into_id: Option<String>,
    pub dedupe_key: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewNotificationParams {
    pub event_id: String,
    pub kind: NotificationKind,
    pub from_user_id: String,
    pub to_user_id: String,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub post_id: Option<String>,
    pub conversation_id: Option<String>,
}

impl Notification {
    pub fn new(params: NewNotificationParams) -> Self {
        let dedupe_key = dedupe_key(&params.event_id, &params.to_user_id, params.kind, false);
        Self::build(params, dedupe_key, false)
    }

    pub fn summary(params: NewNotificationParams) -> Self {
        let dedupe_key = dedupe_key(&params.event_id, &params.to_user_id, params.kind, true);
        Self::build(params, dedupe_key, true)
    }

    fn build(params: NewNotificationParams, dedupe_key: String, is_summary: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from_user_id: params.from_user_id,
            to_user_id: params.to_user_id,
            title: params.title,
            message: params.message,
            payload: Json(params.payload),
            kind: params.kind,
            is_read: false,
            post_id: params.post_id,
            conversation_id: params.conversation_id,
            is_bundled: false,
            is_summary,
            bundled_into_id: None,
            dedupe_key,
            created_at: Utc::now(),
        }
    }
}

/// Ledger key: one row per (event, recipient, kind), summaries keyed apart.
pub fn dedupe_key(event_id: &str, to_user_id: &str, kind: NotificationKind, summary: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(event_id.as_bytes());
    hasher.update(b"|");
    hasher.update(to_user_id.as_bytes());
    hasher.update(b"|");
    hasher.update(kind.as_str().as_bytes());
    if summary {
        hasher.update(b"|summary");
    }
    hex::encode(hasher.finalize())
}
