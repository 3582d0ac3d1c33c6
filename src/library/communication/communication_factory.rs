use crate::library::communication::event::{NotificationPublisher, QueueProvider};

/// Hands out the bus-facing halves of a service
///
/// Services are generic over this trait so that the same code runs on top of
/// redis in production and an in-memory bus in tests.
pub trait CommunicationFactory {
    /// Source of consumable queues
    type QueueProvider: QueueProvider + Send + Sync;
    /// Sink for outgoing notifications
    type NotificationPublisher: NotificationPublisher + Send + Sync;

    /// Provider used to join consumer groups
    fn queue_provider(&self) -> Self::QueueProvider;
    /// Publisher appending to the queue of each notification
    fn notification_publisher(&self) -> Self::NotificationPublisher;
}
