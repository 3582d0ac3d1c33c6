use super::super::super::event::{
    ConsumerGroupDescriptor, QueueDescriptor, QueueLocation, QueueProvider,
};
use super::{
    RedisConnectionVariant, RedisFactory, RedisQueueEntry, STREAM_ID_ADDITIONS, STREAM_ID_HEAD,
    STREAM_ID_TAIL,
};
use crate::library::BoxedError;
use async_trait::async_trait;
use futures::{
    stream::{self, BoxStream},
    StreamExt,
};
use redis::aio::ConnectionLike;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, RedisResult};
use std::time::Duration;
use tracing::{debug, error};

/// Queue provider implementation using [Redis Streams](https://redis.io/topics/streams-intro)
pub struct RedisQueueProvider<F: RedisFactory + Send + Sync> {
    factory: F,
}

impl<F: RedisFactory + Send + Sync> RedisQueueProvider<F> {
    /// Creates a new instance with a given [`RedisFactory`]
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl<F> QueueProvider for RedisQueueProvider<F>
where
    F: RedisFactory + Send + Sync + 'static,
{
    type Entry = RedisQueueEntry<F::Connection>;

    /// Consumes a redis stream data structure using the following steps:
    ///
    /// 1. Create the stream and/or consumer group if it does not exist
    /// 2. Start streaming entries from the PEL until the queue head is reached
    /// 3. Wait for and stream new entries in a blocking manner
    /// 4. Bail if no messages has been received within `idle_timeout` or block indefinitely
    async fn consume(
        &self,
        queue: QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        batch_size: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError> {
        let key = queue.key().to_owned();
        let group_name = group.identifier().to_string();

        // Create a redis connection for the blocking XREADGROUP command
        let mut con = self
            .factory
            .connection(RedisConnectionVariant::Owned)
            .await?;

        create_consumer_group(&mut con, &key, &group_name, group.start()).await;

        // A block duration of zero waits indefinitely
        let block_duration = idle_timeout
            .map(|d| d.as_millis().try_into().unwrap_or(usize::MAX))
            .unwrap_or_default();

        let read_options = StreamReadOptions::default()
            .group(&group_name, consumer)
            .count(batch_size)
            .block(block_duration);

        let entry_stream = xread_stream(con, read_options, key.clone());

        // Acknowledgements are sent over the shared connection so that the blocking one is not disturbed
        let ack_con_stream = shared_redis_stream(self.factory.clone());

        let stream = entry_stream
            .zip(ack_con_stream)
            .map(move |(entry, con)| -> Result<Self::Entry, BoxedError> {
                let entry = entry?;
                let ack_con = con?;
                let entry = RedisQueueEntry::new(ack_con, entry, key.clone(), group_name.clone())?;

                Ok(entry)
            })
            .boxed();

        Ok(stream)
    }
}

async fn create_consumer_group<C: ConnectionLike + Send>(
    con: &mut C,
    key: &str,
    group: &str,
    start: QueueLocation,
) {
    let start_id = match start {
        QueueLocation::Head => STREAM_ID_HEAD,
        QueueLocation::Tail => STREAM_ID_TAIL,
    };

    // Fails with BUSYGROUP when the group already exists which is fine
    if let Err(error) = con
        .xgroup_create_mkstream::<_, _, _, ()>(key, group, start_id)
        .await
    {
        debug!(key, group, %error, "Consumer group not created");
    }
}

fn shared_redis_stream<F>(factory: F) -> BoxStream<'static, Result<F::Connection, BoxedError>>
where
    F: RedisFactory + Send + Sync + 'static,
{
    stream::repeat(factory)
        .then(|factory| async move {
            factory
                .connection(RedisConnectionVariant::Multiplexed)
                .await
        })
        .boxed()
}

fn xread_stream<C: ConnectionLike + Send + Sync + 'static>(
    con: C,
    options: StreamReadOptions,
    key: String,
) -> BoxStream<'static, RedisResult<StreamId>> {
    let initial_id: String = STREAM_ID_HEAD.to_string();

    let stream = stream::unfold((con, options, initial_id), move |(mut con, options, id)| {
        let key = key.to_owned();

        async move {
            let result = con
                .xread_options::<_, _, StreamReadReply>(&[&key], &[&id], &options)
                .await;

            match result {
                Ok(mut reply) => {
                    let stream = reply.keys.pop()?;

                    // If we are already operating on "latest" then continue doing so
                    if id == STREAM_ID_ADDITIONS {
                        Some((Ok(stream.ids), (con, options, id)))
                    }
                    // If we are processing pending messages after a crash and have more, run through them
                    else if let Some(next_id) = stream.ids.last().map(|entry| entry.id.to_owned())
                    {
                        Some((Ok(stream.ids), (con, options, next_id)))
                    }
                    // If we have finished processing pending messages after a crash, move to "latest"
                    else {
                        Some((
                            Ok(stream.ids),
                            (con, options, STREAM_ID_ADDITIONS.to_string()),
                        ))
                    }
                }
                Err(error) => {
                    error!(%key, %error, "Encountered error reading from redis stream");
                    None
                }
            }
        }
    });

    // Entries are fetched in batches but yielded one at a time
    stream
        .flat_map(|result: RedisResult<Vec<StreamId>>| match result {
            Ok(batch) => stream::iter(batch).map(Ok).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        })
        .boxed()
}
