pub mod access;
pub mod bundler;
pub mod dispatcher;
pub mod fans;
pub mod interactions;
pub mod invites;
pub mod pipeline;

use crate::domain::{events::DomainEvent, ports::EventPublisher};
use tracing::warn;

/// Hands an event to the bus. A lost event costs a notification, never the action.
pub(crate) async fn emit(events: &dyn EventPublisher, event: DomainEvent) {
    let kind = event.kind_name();
    let event_id = event.event_id().to_string();
    if let Err(e) = events.publish(event).await {
        warn!(event_kind = kind, event_id = %event_id, "Failed to publish domain event: {}", e);
    }
}
