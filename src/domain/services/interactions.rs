use std::sync::Arc;
use crate::domain::{
    events::DomainEvent,
    ports::{EventPublisher, PostRepository},
    services::{access::AccessResolver, emit},
};
use crate::error::AppError;
use tracing::info;

/// Write path for post interactions. Authorizes, persists, then emits.
pub struct InteractionService {
    access: Arc<AccessResolver>,
    posts: Arc<dyn PostRepository>,
    events: Arc<dyn EventPublisher>,
}

impl InteractionService {
    pub fn new(access: Arc<AccessResolver>, posts: Arc<dyn PostRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { access, posts, events }
    }

    /// Returns `false` if the user had already reacted; no event is emitted then.
    pub async fn react(&self, actor_id: &str, post_id: &str) -> Result<bool, AppError> {
        let post = self.access.require_access(actor_id, post_id).await?;

        let created = self.posts.add_reaction(&post.id, actor_id).await?;
        if !created {
            return Ok(false);
        }
        info!(post_id = %post.id, actor_id = %actor_id, "Recorded reaction");

        emit(self.events.as_ref(), DomainEvent::PostReacted {
            event_id: DomainEvent::new_event_id(),
            actor_id: actor_id.to_string(),
            post_id: post.id,
        }).await;
        Ok(true)
    }

    pub async fn comment(&self, actor_id: &str, post_id: &str, text: &str) -> Result<String, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text must not be empty".into()));
        }

        let post = self.access.require_access(actor_id, post_id).await?;
        let comment_id = self.posts.add_comment(&post.id, actor_id, text).await?;
        info!(post_id = %post.id, comment_id = %comment_id, "Recorded comment");

        emit(self.events.as_ref(), DomainEvent::PostCommented {
            event_id: DomainEvent::new_event_id(),
            actor_id: actor_id.to_string(),
            post_id: post.id,
            comment_id: comment_id.clone(),
            text: text.to_string(),
        }).await;
        Ok(comment_id)
    }

    // Message storage lives in the chat service; only the notification side is handled here.
    pub async fn send_message(&self, actor_id: &str, recipient_id: &str, conversation_id: &str, text: &str) -> Result<(), AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Message text must not be empty".into()));
        }
        if recipient_id == actor_id {
            return Err(AppError::Validation("Cannot message yourself".into()));
        }

        emit(self.events.as_ref(), DomainEvent::MessageSent {
            event_id: DomainEvent::new_event_id(),
            actor_id: actor_id.to_string(),
            recipient_id: recipient_id.to_string(),
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
        }).await;
        Ok(())
    }
}
