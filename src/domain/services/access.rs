use std::sync::Arc;
use crate::domain::{
    models::{invite::InviteRecord, post::Post},
    ports::{InviteRepository, PostRepository},
};
use crate::error::AppError;
use tracing::debug;

/// Decides who may see and interact with an artist's post.
///
/// Generic (broadcast) posts and targeted posts are resolved by separate
/// branches: a generic post is open to every standing fan of its owner, a
/// targeted post only to users holding a granting record for that post.
pub struct AccessResolver {
    posts: Arc<dyn PostRepository>,
    invites: Arc<dyn InviteRepository>,
}

impl AccessResolver {
    pub fn new(posts: Arc<dyn PostRepository>, invites: Arc<dyn InviteRepository>) -> Self {
        Self { posts, invites }
    }

    pub async fn load_post(&self, post_id: &str) -> Result<Post, AppError> {
        self.posts.find_by_id(post_id).await?
            .ok_or(AppError::NotFound(format!("Post {} not found", post_id)))
    }

    pub async fn can_access(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let post = self.load_post(post_id).await?;
        self.can_access_post(user_id, &post).await
    }

    pub async fn can_access_post(&self, user_id: &str, post: &Post) -> Result<bool, AppError> {
        if post.is_owned_by(user_id) {
            return Ok(true);
        }

        let granted = if post.kind.is_generic() {
            self.invites.find_generic_relationship(user_id, &post.owner_user_id).await?.is_some()
        } else {
            self.invites.find_for_user_and_post(user_id, &post.id).await?
                .is_some_and(|invite| invite.status.grants_access())
        };

        debug!(user_id = %user_id, post_id = %post.id, kind = %post.kind, granted, "Resolved post access");
        Ok(granted)
    }

    /// The record that links `user_id` to the post, if any.
    ///
    /// For generic posts without a per-post record this falls back to the
    /// user's standing relationship with the owner.
    pub async fn resolve_relation(&self, user_id: &str, post_id: &str) -> Result<Option<InviteRecord>, AppError> {
        let post = self.load_post(post_id).await?;

        if let Some(invite) = self.invites.find_for_user_and_post(user_id, &post.id).await? {
            return Ok(Some(invite));
        }

        if post.kind.is_generic() {
            return self.invites.find_generic_relationship(user_id, &post.owner_user_id).await;
        }

        Ok(None)
    }

    /// Loads the post and fails with `Forbidden` unless `user_id` may act on it.
    pub async fn require_access(&self, user_id: &str, post_id: &str) -> Result<Post, AppError> {
        let post = self.load_post(post_id).await?;
        if !self.can_access_post(user_id, &post).await? {
            return Err(AppError::Forbidden(format!("No access to post {}", post_id)));
        }
        Ok(post)
    }
}
