use super::super::json::JsonQueueEntry;
use super::{RedisQueueError, STREAM_PAYLOAD_KEY};
use crate::library::communication::event::RawQueueEntry;
use crate::library::EmptyResult;
use async_trait::async_trait;
use redis::aio::ConnectionLike;
use redis::streams::StreamId;
use redis::AsyncCommands;
use tracing::trace;

/// Stream entry read through a consumer group, acknowledged with [`XACK`](https://redis.io/commands/xack)
pub struct RedisQueueEntry<C> {
    ack_con: C,
    stream: String,
    group: String,
    entry_id: String,
    payload: Vec<u8>,
    acknowledged: bool,
}

impl<C> RedisQueueEntry<C>
where
    C: ConnectionLike + Send + Sync,
{
    pub(super) fn new(
        ack_con: C,
        entry: StreamId,
        stream: String,
        group: String,
    ) -> Result<Self, RedisQueueError> {
        let payload = extract_payload(&entry)?;

        Ok(Self {
            ack_con,
            stream,
            group,
            entry_id: entry.id,
            payload,
            acknowledged: false,
        })
    }
}

fn extract_payload(entry: &StreamId) -> Result<Vec<u8>, RedisQueueError> {
    entry
        .get(STREAM_PAYLOAD_KEY)
        .ok_or_else(|| RedisQueueError::MissingPayload(entry.id.clone()))
}

#[async_trait]
impl<C> RawQueueEntry for RedisQueueEntry<C>
where
    C: ConnectionLike + Send + Sync,
{
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Removes the entry from the pending list of the group, repeated calls are no-ops
    async fn acknowledge(&mut self) -> EmptyResult {
        if self.acknowledged {
            return Ok(());
        }

        self.ack_con
            .xack::<_, _, _, ()>(&self.stream, &self.group, &[&self.entry_id])
            .await?;

        self.acknowledged = true;
        trace!(stream = %self.stream, id = %self.entry_id, "Acknowledged entry");

        Ok(())
    }
}

impl<C> JsonQueueEntry for RedisQueueEntry<C> where C: ConnectionLike + Send + Sync {}
