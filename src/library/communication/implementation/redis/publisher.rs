use super::super::super::event::{QueueDescriptor, RawNotificationPublisher};
use super::super::json::JsonNotificationPublisher;
use super::{RedisConnectionVariant, RedisFactory};
use super::{STREAM_ID_NEW, STREAM_PAYLOAD_KEY};
use crate::library::EmptyResult;
use async_trait::async_trait;
use redis::streams::StreamMaxlen;
use redis::AsyncCommands;
use tracing::trace;

/// [`NotificationPublisher`](super::super::super::event::NotificationPublisher) implementation using [`XADD`](https://redis.io/commands/xadd)
#[derive(Clone)]
pub struct RedisPublisher<F: RedisFactory> {
    factory: F,
}

impl<F> RedisPublisher<F>
where
    F: RedisFactory,
{
    /// Creates a new instance which draws its connections from the given factory
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F> JsonNotificationPublisher for RedisPublisher<F> where F: RedisFactory + Send + Sync {}

#[async_trait]
impl<F> RawNotificationPublisher for RedisPublisher<F>
where
    F: RedisFactory + Send + Sync,
{
    async fn publish_raw(&self, data: &[u8], descriptor: QueueDescriptor) -> EmptyResult {
        let limit = StreamMaxlen::Approx(descriptor.limit());
        let key = descriptor.key();

        let mut con = self
            .factory
            .connection(RedisConnectionVariant::Multiplexed)
            .await?;

        let id: String = con
            .xadd_maxlen(key, limit, STREAM_ID_NEW, &[(STREAM_PAYLOAD_KEY, data)])
            .await?;

        trace!(%key, %id, "Appended notification");

        Ok(())
    }
}
