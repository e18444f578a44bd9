pub mod devices;
pub mod health;
pub mod invites;
pub mod messages;
pub mod notifications;
pub mod posts;
