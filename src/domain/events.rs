use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Facts emitted by action handlers once their write has been authorized and
/// persisted. The notification pipeline turns them into recipients and rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    PostReacted {
        event_id: String,
        actor_id: String,
        post_id: String,
    },
    PostCommented {
        event_id: String,
        actor_id: String,
        post_id: String,
        comment_id: String,
        text: String,
    },
    InviteCreated {
        event_id: String,
        actor_id: String,
        post_id: String,
        invite_id: String,
        invitee_id: String,
    },
    InviteAccepted {
        event_id: String,
        actor_id: String,
        post_id: String,
        invite_id: String,
    },
    MessageSent {
        event_id: String,
        actor_id: String,
        recipient_id: String,
        conversation_id: String,
        text: String,
    },
}

impl DomainEvent {
    pub fn new_event_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn event_id(&self) -> &str {
        match self {
            DomainEvent::PostReacted { event_id, .. }
            | DomainEvent::PostCommented { event_id, .. }
            | DomainEvent::InviteCreated { event_id, .. }
            | DomainEvent::InviteAccepted { event_id, .. }
            | DomainEvent::MessageSent { event_id, .. } => event_id,
        }
    }

    pub fn actor_id(&self) -> &str {
        match self {
            DomainEvent::PostReacted { actor_id, .. }
            | DomainEvent::PostCommented { actor_id, .. }
            | DomainEvent::InviteCreated { actor_id, .. }
            | DomainEvent::InviteAccepted { actor_id, .. }
            | DomainEvent::MessageSent { actor_id, .. } => actor_id,
        }
    }

    pub fn post_id(&self) -> Option<&str> {
        match self {
            DomainEvent::PostReacted { post_id, .. }
            | DomainEvent::PostCommented { post_id, .. }
            | DomainEvent::InviteCreated { post_id, .. }
            | DomainEvent::InviteAccepted { post_id, .. } => Some(post_id),
            DomainEvent::MessageSent { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DomainEvent::PostReacted { .. } => "POST_REACTED",
            DomainEvent::PostCommented { .. } => "POST_COMMENTED",
            DomainEvent::InviteCreated { .. } => "INVITE_CREATED",
            DomainEvent::InviteAccepted { .. } => "INVITE_ACCEPTED",
            DomainEvent::MessageSent { .. } => "MESSAGE_SENT",
        }
    }
}
