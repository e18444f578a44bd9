pub mod sqlite_post_repo;
pub mod sqlite_invite_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_device_repo;
pub mod sqlite_outbox_repo;

pub mod postgres_post_repo;
pub mod postgres_invite_repo;
pub mod postgres_notification_repo;
pub mod postgres_device_repo;
pub mod postgres_outbox_repo;
