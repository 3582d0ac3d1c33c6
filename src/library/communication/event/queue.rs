use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use serde::Deserialize;

/// Name and retention of a notification queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDescriptor {
    key: String,
    limit: usize,
}

impl QueueDescriptor {
    /// Queue stored under `key` holding roughly `limit` entries
    pub fn new(key: String, limit: usize) -> Self {
        Self { key, limit }
    }

    /// Identifier of the queue on the bus
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Approximate number of entries kept before the oldest ones are trimmed
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Position at which a newly created consumer group starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueLocation {
    /// Oldest entry still retained
    Head,
    /// Only entries appended after the group was created
    Tail,
}

/// Undecoded entry handed out by a [`QueueProvider`](super::QueueProvider)
#[async_trait]
pub trait RawQueueEntry {
    /// Bytes as they were published
    fn payload(&self) -> &[u8];

    /// Marks the entry as processed for the consuming group
    async fn acknowledge(&mut self) -> EmptyResult;
}

/// Entry that knows how to decode its payload
pub trait QueueEntry: RawQueueEntry {
    /// Decodes the payload into `T`
    fn parse_payload<'a, T>(&'a self) -> Result<T, BoxedError>
    where
        T: Deserialize<'a>;
}

