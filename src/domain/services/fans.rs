use std::collections::HashSet;
use std::sync::Arc;
use crate::domain::ports::{InviteRepository, PostRepository};
use crate::error::AppError;
use tracing::debug;

/// Computes who is entitled to hear about activity on a post.
pub struct FanEnumeration {
    posts: Arc<dyn PostRepository>,
    invites: Arc<dyn InviteRepository>,
}

impl FanEnumeration {
    pub fn new(posts: Arc<dyn PostRepository>, invites: Arc<dyn InviteRepository>) -> Self {
        Self { posts, invites }
    }

    pub async fn get_post_owner_id(&self, post_id: &str) -> Result<String, AppError> {
        self.posts.find_by_id(post_id).await?
            .map(|post| post.owner_user_id)
            .ok_or(AppError::NotFound(format!("Post {} not found", post_id)))
    }

    /// Users who can currently see `post_id`, never including its owner.
    ///
    /// Generic posts reach every standing fan of the owner; targeted posts
    /// reach only users with an accepted or generic record for that post.
    pub async fn fans_with_access(&self, post_id: &str, exclude_user_id: Option<&str>) -> Result<HashSet<String>, AppError> {
        let post = self.posts.find_by_id(post_id).await?
            .ok_or(AppError::NotFound(format!("Post {} not found", post_id)))?;

        let candidates = if post.kind.is_generic() {
            self.invites.list_generic_fans(&post.owner_user_id).await?
        } else {
            self.invites.list_users_with_post_access(&post.id).await?
        };

        let fans: HashSet<String> = candidates
            .into_iter()
            .filter(|user_id| *user_id != post.owner_user_id)
            .filter(|user_id| Some(user_id.as_str()) != exclude_user_id)
            .collect();

        debug!(post_id = %post.id, kind = %post.kind, count = fans.len(), "Enumerated fans with access");
        Ok(fans)
    }
}
