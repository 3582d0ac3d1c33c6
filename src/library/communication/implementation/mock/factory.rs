use super::{MemoryBus, MockNotificationPublisher};
use crate::library::communication::CommunicationFactory;
use std::sync::Arc;

/// Factory which consumes from an in-memory bus and publishes into an expectation-checking mock
#[derive(Clone)]
pub struct MockCommunicationFactory {
    bus: MemoryBus,
    publisher: Arc<MockNotificationPublisher>,
}

impl CommunicationFactory for MockCommunicationFactory {
    type QueueProvider = MemoryBus;
    type NotificationPublisher = Arc<MockNotificationPublisher>;

    fn queue_provider(&self) -> Self::QueueProvider {
        self.bus.clone()
    }

    fn notification_publisher(&self) -> Self::NotificationPublisher {
        self.publisher.clone()
    }
}

impl MockCommunicationFactory {
    /// Creates a factory consuming from the given bus
    pub fn new(bus: MemoryBus) -> Self {
        Self {
            bus,
            publisher: Arc::new(MockNotificationPublisher::default()),
        }
    }

    /// Bus the queue providers are drawn from
    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }
}
