use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use crate::domain::events::DomainEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown outbox status: {0}")]
pub struct UnknownOutboxStatus(pub String);

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Processing => "PROCESSING",
            OutboxStatus::Completed => "COMPLETED",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OutboxStatus {
    type Error = UnknownOutboxStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(OutboxStatus::Pending),
            "PROCESSING" => Ok(OutboxStatus::Processing),
            "COMPLETED" => Ok(OutboxStatus::Completed),
            "FAILED" => Ok(OutboxStatus::Failed),
            _ => Err(UnknownOutboxStatus(value)),
        }
    }
}

/// A domain event waiting for (or done with) notification fan-out.
///
/// Rows are claimed by flipping them to `PROCESSING`; a claim older than the
/// worker lease is considered abandoned and handed out again.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct OutboxEntry {
    pub id: String,
    pub event_type: String,
    pub payload: Json<DomainEvent>,
    #[sqlx(try_from = "String")]
    pub status: OutboxStatus,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event.kind_name().to_string(),
            payload: Json(event),
            status: OutboxStatus::Pending,
            attempts: 0,
            error_message: None,
            claimed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn event(&self) -> &DomainEvent {
        &self.payload.0
    }
}
