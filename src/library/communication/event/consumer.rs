use super::{ConsumerGroupDescriptor, Notification, QueueEntry, QueueProvider, RawQueueEntry};
use crate::library::EmptyResult;
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_CONCURRENCY: usize = DEFAULT_BATCH_SIZE;
const DEFAULT_IDLE_TIMEOUT: Option<Duration> = None;

/// Entity which may consume and process [`Notifications`](Notification)
#[async_trait]
pub trait Consumer {
    /// Notification to consume
    type Notification: Notification;

    /// Processes an event notification and returns whether it succeeded or failed
    async fn consume(&self, notification: Self::Notification) -> EmptyResult;
}

/// Helper functions to aid the consumption of messages
#[async_trait]
pub trait ConsumerExt {
    /// Consumes notifications from a queue using the given provider.
    ///
    /// Entries are acknowledged once they have been processed successfully. Entries which
    /// can not be deserialized are reported and acknowledged as well, dropping them for good.
    /// Entries whose processing failed are left unacknowledged.
    async fn consume_queue<Q>(
        &self,
        provider: Q,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
    ) -> EmptyResult
    where
        Q: QueueProvider + Send + Sync;
}

#[async_trait]
impl<C> ConsumerExt for C
where
    C: Consumer + Send + Sync,
    C::Notification: DeserializeOwned + Send + Sync,
{
    async fn consume_queue<Q>(
        &self,
        provider: Q,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
    ) -> EmptyResult
    where
        Q: QueueProvider + Send + Sync,
    {
        let queue = C::Notification::queue();
        let queue_key = queue.key().to_owned();

        let stream = provider
            .consume(queue, group, consumer, DEFAULT_BATCH_SIZE, DEFAULT_IDLE_TIMEOUT)
            .await?;

        debug!(queue = %queue_key, group = %group.identifier(), consumer, "Consuming queue");

        stream
            .for_each_concurrent(Some(DEFAULT_CONCURRENCY), |item| async move {
                let notification_type = type_name::<C::Notification>();

                let mut entry = match item {
                    Ok(entry) => entry,
                    Err(error) => {
                        warn!(notification_type, %error, "Failed to receive notification");
                        return;
                    }
                };

                match entry.parse_payload::<C::Notification>() {
                    Ok(notification) => {
                        if let Err(error) = self.consume(notification).await {
                            warn!(notification_type, %error, "Failed to consume notification");
                            return;
                        }
                    }
                    Err(error) => {
                        warn!(notification_type, %error, "Dropping malformed notification");
                    }
                }

                if let Err(error) = entry.acknowledge().await {
                    warn!(notification_type, %error, "Failed to acknowledge notification");
                }
            })
            .await;

        Ok(())
    }
}
