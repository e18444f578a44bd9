use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostKind {
    InvitePhoto,
    InviteOnly,
    Generic,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown post kind: {0}")]
pub struct UnknownPostKind(pub String);

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::InvitePhoto => "INVITE_PHOTO",
            PostKind::InviteOnly => "INVITE_ONLY",
            PostKind::Generic => "GENERIC",
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, PostKind::Generic)
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PostKind {
    type Error = UnknownPostKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "INVITE_PHOTO" => Ok(PostKind::InvitePhoto),
            "INVITE_ONLY" => Ok(PostKind::InviteOnly),
            "GENERIC" => Ok(PostKind::Generic),
            _ => Err(UnknownPostKind(value)),
        }
    }
}

// Owned by the gallery side of the platform; this service only reads it.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Post {
    pub id: String,
    pub owner_user_id: String,
    #[sqlx(try_from = "String")]
    pub kind: PostKind,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(owner_user_id: String, kind: PostKind, caption: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_user_id,
            kind,
            caption,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }
}
