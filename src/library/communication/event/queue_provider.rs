use super::{ConsumerGroupDescriptor, QueueDescriptor, QueueEntry};
use crate::library::BoxedError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

/// Reads queues on behalf of a [consumer group](ConsumerGroupDescriptor)
#[async_trait]
pub trait QueueProvider {
    /// Entry type yielded by the stream
    type Entry: QueueEntry + Send + Sync;

    /// Joins `group` as `consumer`, creating the group if needed, and streams its share of `queue`
    ///
    /// The stream ends once nothing arrived within `idle_timeout`, or never if it is `None`.
    async fn consume(
        &self,
        queue: QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        batch_size: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError>;
}
