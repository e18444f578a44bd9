use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::domain::{
    events::DomainEvent,
    models::{identity::CallerIdentity, invite::{InviteRecord, InviteStatus}},
    ports::{EventPublisher, InviteRepository, PostRepository},
    services::emit,
};
use crate::error::AppError;
use tracing::{debug, info};

/// The only writer of invite status.
pub struct InviteLifecycle {
    posts: Arc<dyn PostRepository>,
    invites: Arc<dyn InviteRepository>,
    events: Arc<dyn EventPublisher>,
}

impl InviteLifecycle {
    pub fn new(posts: Arc<dyn PostRepository>, invites: Arc<dyn InviteRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { posts, invites, events }
    }

    /// Artist invites `invitee_id` to one of their targeted posts.
    pub async fn create_invite(
        &self,
        actor: &CallerIdentity,
        post_id: &str,
        invitee_id: &str,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<InviteRecord, AppError> {
        let post = self.posts.find_by_id(post_id).await?
            .ok_or(AppError::NotFound(format!("Post {} not found", post_id)))?;

        if !actor.is_artist() || !post.is_owned_by(&actor.user_id) {
            return Err(AppError::Forbidden("Only the post owner can invite".into()));
        }
        if post.kind.is_generic() {
            return Err(AppError::Validation("Generic posts are open to all fans and take no invites".into()));
        }
        if invitee_id == actor.user_id {
            return Err(AppError::Validation("Cannot invite yourself".into()));
        }
        if valid_until.is_some_and(|until| until <= Utc::now()) {
            return Err(AppError::Validation("valid_until must be in the future".into()));
        }
        if self.invites.find_for_user_and_post(invitee_id, post_id).await?.is_some() {
            return Err(AppError::Conflict("User already has an invite for this post".into()));
        }

        let invite = InviteRecord::pending(invitee_id.to_string(), post.id.clone(), post.owner_user_id.clone(), valid_until);
        let created = self.invites.create(&invite).await?;
        info!(invite_id = %created.id, post_id = %post.id, invitee_id = %invitee_id, "Created invite");

        emit(self.events.as_ref(), DomainEvent::InviteCreated {
            event_id: DomainEvent::new_event_id(),
            actor_id: actor.user_id.clone(),
            post_id: post.id,
            invite_id: created.id.clone(),
            invitee_id: invitee_id.to_string(),
        }).await;

        Ok(created)
    }

    /// Fan becomes a standing follower of the artist who owns `post_id`.
    pub async fn follow(&self, fan_id: &str, post_id: &str) -> Result<InviteRecord, AppError> {
        let post = self.posts.find_by_id(post_id).await?
            .ok_or(AppError::NotFound(format!("Post {} not found", post_id)))?;

        if !post.kind.is_generic() {
            return Err(AppError::Validation("Artists can only be followed through a generic post".into()));
        }
        if post.is_owned_by(fan_id) {
            return Err(AppError::Validation("Cannot follow yourself".into()));
        }
        if self.invites.find_for_user_and_post(fan_id, post_id).await?.is_some() {
            return Err(AppError::Conflict("Relationship already exists for this post".into()));
        }

        let record = InviteRecord::generic(fan_id.to_string(), post.id.clone(), post.owner_user_id.clone());
        let created = self.invites.create(&record).await?;
        info!(invite_id = %created.id, artist_id = %post.owner_user_id, fan_id = %fan_id, "Fan followed artist");
        Ok(created)
    }

    pub async fn transition(&self, actor_id: &str, invite_id: &str, next: InviteStatus) -> Result<InviteRecord, AppError> {
        let invite = self.invites.find_by_id(invite_id).await?
            .filter(|invite| invite.user_id == actor_id)
            .ok_or(AppError::NotFound("Invite not found".into()))?;

        invite.status.check_transition(next)?;
        if next == InviteStatus::Accepted && invite.is_expired(Utc::now()) {
            return Err(AppError::Conflict("Invite has expired".into()));
        }

        let updated = match self.invites.transition(invite_id, actor_id, next).await? {
            Some(updated) => updated,
            None => return Err(self.explain_lost_transition(invite_id, next).await),
        };
        info!(invite_id = %invite_id, status = %updated.status, "Invite transitioned");

        if updated.status == InviteStatus::Accepted {
            emit(self.events.as_ref(), DomainEvent::InviteAccepted {
                event_id: DomainEvent::new_event_id(),
                actor_id: actor_id.to_string(),
                post_id: updated.artist_post_id.clone(),
                invite_id: updated.id.clone(),
            }).await;
        }

        Ok(updated)
    }

    // The conditional update matched nothing: someone else moved or removed the record.
    async fn explain_lost_transition(&self, invite_id: &str, next: InviteStatus) -> AppError {
        match self.invites.find_by_id(invite_id).await {
            Ok(Some(current)) => current.status.check_transition(next)
                .err()
                .unwrap_or_else(|| AppError::Conflict("Invite changed concurrently".into())),
            Ok(None) => AppError::NotFound("Invite not found".into()),
            Err(e) => e,
        }
    }

    /// Deletes the caller's own invite. Someone else's invite reads as not found.
    pub async fn delete(&self, actor_id: &str, invite_id: &str) -> Result<(), AppError> {
        self.invites.delete(invite_id, actor_id).await?;
        info!(invite_id = %invite_id, "Deleted invite");
        Ok(())
    }

    /// Removes rejected and expired records, never accepted ones. Safe to re-run.
    pub async fn purge_stale_invites(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let removed = self.invites.purge_stale(now).await?;
        if removed > 0 {
            info!(removed, "Purged stale invites");
        } else {
            debug!("Invite purge found nothing to remove");
        }
        Ok(removed)
    }
}
