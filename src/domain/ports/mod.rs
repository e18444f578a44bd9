use crate::domain::events::DomainEvent;
use crate::domain::models::{
    delivery::DeliveryReport, device::Device, identity::CallerIdentity,
    invite::{InviteRecord, InviteStatus}, notification::{Notification, NotificationKind},
    outbox::OutboxEntry, post::Post,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &InviteRecord) -> Result<InviteRecord, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<InviteRecord>, AppError>;
    async fn find_for_user_and_post(&self, user_id: &str, post_id: &str) -> Result<Option<InviteRecord>, AppError>;
    async fn find_generic_relationship(&self, user_id: &str, artist_id: &str) -> Result<Option<InviteRecord>, AppError>;
    async fn list_generic_fans(&self, artist_id: &str) -> Result<Vec<String>, AppError>;
    async fn list_users_with_post_access(&self, post_id: &str) -> Result<Vec<String>, AppError>;
    /// Applies `next` only while the record is still `PENDING` and owned by `user_id`.
    /// Returns `None` when no row matched.
    async fn transition(&self, id: &str, user_id: &str, next: InviteStatus) -> Result<Option<InviteRecord>, AppError>;
    async fn delete(&self, id: &str, user_id: &str) -> Result<(), AppError>;
    async fn purge_stale(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, AppError>;
    async fn exists_by_dedupe_key(&self, dedupe_key: &str) -> Result<bool, AppError>;
    async fn count_unbundled_since(&self, to_user_id: &str, post_id: &str, kind: NotificationKind, since: DateTime<Utc>) -> Result<i64, AppError>;
    async fn has_summary_since(&self, to_user_id: &str, post_id: &str, since: DateTime<Utc>) -> Result<bool, AppError>;
    async fn list_unbundled_since(&self, to_user_id: &str, post_id: &str, since: DateTime<Utc>) -> Result<Vec<Notification>, AppError>;
    /// Inserts `summary` and points every still-unbundled original at it, atomically.
    /// Returns `None` (and writes nothing) if none of the originals were still unbundled.
    async fn bundle(&self, summary: &Notification, original_ids: &[String]) -> Result<Option<Notification>, AppError>;
    async fn list_for_user(&self, to_user_id: &str, limit: i64) -> Result<Vec<Notification>, AppError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError>;
    /// Returns `false` when the user had already reacted.
    async fn add_reaction(&self, post_id: &str, user_id: &str) -> Result<bool, AppError>;
    async fn add_comment(&self, post_id: &str, user_id: &str, text: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn register(&self, device: &Device) -> Result<Device, AppError>;
    async fn active_devices(&self, user_id: &str) -> Result<Vec<Device>, AppError>;
    async fn deactivate(&self, push_token: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PushService: Send + Sync {
    async fn send(&self, handles: &[String], title: &str, body: &str, payload: &Value) -> Result<DeliveryReport, AppError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_caller(&self, token: &str) -> Result<CallerIdentity, AppError>;
}

/// Durable queue of domain events awaiting notification fan-out.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn enqueue(&self, entry: &OutboxEntry) -> Result<OutboxEntry, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<OutboxEntry>, AppError>;
    /// Atomically moves up to `limit` pending rows to `PROCESSING` and bumps their attempt count.
    async fn claim_pending(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<OutboxEntry>, AppError>;
    async fn complete(&self, id: &str) -> Result<(), AppError>;
    async fn fail(&self, id: &str, error_message: &str) -> Result<(), AppError>;
    /// Hands a claimed row back to the queue for another attempt.
    async fn release(&self, id: &str, error_message: &str) -> Result<(), AppError>;
    /// Returns rows claimed before `before` to `PENDING`. Their worker is presumed dead.
    async fn release_stale_claims(&self, before: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), AppError>;
}
