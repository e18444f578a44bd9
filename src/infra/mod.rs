pub mod events;
pub mod factory;
pub mod identity;
pub mod push;
pub mod repositories;
