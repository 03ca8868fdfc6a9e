use tokio::sync::broadcast;

use crate::models::event::DomainEvent;

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of lifecycle events. Publishing never blocks and never
/// fails the operation that produced the event.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: DomainEvent) {
        let (entity_type, entity_id) = event.subject();
        tracing::info!(
            event = event.name(),
            entity_type,
            %entity_id,
            "domain event published"
        );
        if self.sender.send(event).is_err() {
            tracing::debug!("no event subscribers");
        }
    }

    /// Publishes events collected inside a transaction, once it has committed.
    pub fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}
