use super::{Notification, QueueDescriptor};
use crate::library::EmptyResult;
use async_trait::async_trait;

/// Structure which allows publishing of serialized data into a queue
#[async_trait]
pub trait RawNotificationPublisher {
    /// Appends an opaque payload to a [`Queue`](QueueDescriptor)
    async fn publish_raw(&self, data: &[u8], descriptor: QueueDescriptor) -> EmptyResult;
}

/// Publisher for [`Notifications`](Notification)
///
/// Publishing is at-most-once: implementations make no attempt to retry or persist
/// notifications that could not be delivered to the queue.
#[async_trait]
pub trait NotificationPublisher {
    /// Publishes a [`Notification`] to its designated queue
    async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> EmptyResult;
}
