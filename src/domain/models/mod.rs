pub mod delivery;
pub mod device;
pub mod identity;
pub mod invite;
pub mod notification;
pub mod outbox;
pub mod post;
