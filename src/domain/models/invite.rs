use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
    Generic,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown invite status: {0}")]
pub struct UnknownInviteStatus(pub String);

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "PENDING",
            InviteStatus::Accepted => "ACCEPTED",
            InviteStatus::Rejected => "REJECTED",
            InviteStatus::Generic => "GENERIC",
        }
    }

    /// Whether the record proves the holder may see the post it is attached to.
    pub fn grants_access(&self) -> bool {
        matches!(self, InviteStatus::Accepted | InviteStatus::Generic)
    }

    /// Checks a per-post invite transition.
    ///
    /// Only `PENDING` records move, and only to `ACCEPTED` or `REJECTED`.
    /// `GENERIC` is an initial state of the follow flow and is never a target.
    pub fn check_transition(&self, next: InviteStatus) -> Result<(), AppError> {
        if !matches!(next, InviteStatus::Accepted | InviteStatus::Rejected) {
            return Err(AppError::Validation(format!(
                "Invite status can only be set to ACCEPTED or REJECTED, got {}",
                next
            )));
        }

        match self {
            InviteStatus::Pending => Ok(()),
            InviteStatus::Accepted => Err(AppError::Conflict("Invite already accepted".into())),
            InviteStatus::Rejected => Err(AppError::Conflict("Invite already rejected".into())),
            InviteStatus::Generic => Err(AppError::Conflict(
                "Generic fan relationships cannot be transitioned".into(),
            )),
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for InviteStatus {
    type Error = UnknownInviteStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(InviteStatus::Pending),
            "ACCEPTED" => Ok(InviteStatus::Accepted),
            "REJECTED" => Ok(InviteStatus::Rejected),
            "GENERIC" => Ok(InviteStatus::Generic),
            _ => Err(UnknownInviteStatus(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct InviteRecord {
    pub id: String,
    pub user_id: String,
    pub artist_post_id: String,
    pub artist_id: String,
    pub valid_until: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

impl InviteRecord {
    /// Targeted invite for a single post, waiting on the invitee.
    pub fn pending(user_id: String, artist_post_id: String, artist_id: String, valid_until: Option<DateTime<Utc>>) -> Self {
        Self::with_status(user_id, artist_post_id, artist_id, valid_until, InviteStatus::Pending)
    }

    /// Standing fan relationship created when a fan follows an artist.
    pub fn generic(user_id: String, artist_post_id: String, artist_id: String) -> Self {
        Self::with_status(user_id, artist_post_id, artist_id, None, InviteStatus::Generic)
    }

    fn with_status(
        user_id: String,
        artist_post_id: String,
        artist_id: String,
        valid_until: Option<DateTime<Utc>>,
        status: InviteStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            artist_post_id,
            artist_id,
            valid_until,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }

    /// Mirrors the purge predicate used by the stores.
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.status != InviteStatus::Accepted
            && (self.status == InviteStatus::Rejected || self.is_expired(now))
    }
}
