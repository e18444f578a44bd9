use crate::domain::events::DomainEvent;
use crate::domain::models::outbox::OutboxEntry;
use crate::domain::ports::{EventPublisher, OutboxRepository};
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Publishes domain events by writing them to the outbox table.
///
/// The notification worker polls the table; `signal` lets it pick new rows up
/// without waiting for the next poll.
pub struct OutboxPublisher {
    outbox: Arc<dyn OutboxRepository>,
    signal: Arc<Notify>,
}

impl OutboxPublisher {
    pub fn new(outbox: Arc<dyn OutboxRepository>) -> Self {
        Self { outbox, signal: Arc::new(Notify::new()) }
    }

    pub fn signal(&self) -> Arc<Notify> {
        self.signal.clone()
    }
}

#[async_trait]
impl EventPublisher for OutboxPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), AppError> {
        let entry = self.outbox.enqueue(&OutboxEntry::new(event)).await?;
        debug!(outbox_id = %entry.id, event_type = %entry.event_type, "Queued domain event");
        self.signal.notify_one();
        Ok(())
    }
}
