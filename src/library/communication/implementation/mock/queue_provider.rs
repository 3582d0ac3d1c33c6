use crate::library::communication::event::{
    ConsumerGroupDescriptor, QueueDescriptor, QueueLocation, QueueProvider,
    RawNotificationPublisher, RawQueueEntry,
};
use crate::library::communication::implementation::json::{
    JsonNotificationPublisher, JsonQueueEntry,
};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

#[derive(Default)]
struct BusState {
    queues: HashMap<String, Vec<Vec<u8>>>,
    cursors: HashMap<(String, String), usize>,
}

impl BusState {
    fn join(&mut self, key: &str, group: &str, start: QueueLocation) {
        let length = self.queues.get(key).map(Vec::len).unwrap_or_default();

        self.cursors
            .entry((key.to_owned(), group.to_owned()))
            .or_insert(match start {
                QueueLocation::Head => 0,
                QueueLocation::Tail => length,
            });
    }

    fn next(&mut self, key: &str, group: &str) -> Option<Vec<u8>> {
        let cursor = self.cursors.get_mut(&(key.to_owned(), group.to_owned()))?;
        let payload = self.queues.get(key)?.get(*cursor)?.clone();
        *cursor += 1;
        Some(payload)
    }
}

/// In-memory message bus with consumer group semantics
///
/// Every group keeps a single cursor per queue which is shared by all of its consumers,
/// thus each entry is handed to exactly one consumer of a group while every group sees every entry.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
    notify: Arc<Notify>,
    acknowledged: Arc<AtomicUsize>,
    idle_timeout: Option<Duration>,
}

impl MemoryBus {
    /// Creates a bus whose streams end after being idle for the given duration
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout: Some(idle_timeout),
            ..Default::default()
        }
    }

    /// Number of entries that have been acknowledged by consumers
    pub fn acknowledged(&self) -> usize {
        self.acknowledged.load(Ordering::SeqCst)
    }

    /// Appends a raw payload to a queue, bypassing serialization
    pub fn push_raw(&self, key: &str, payload: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .queues
            .entry(key.to_owned())
            .or_default()
            .push(payload.to_vec());

        self.notify.notify_waiters();
    }
}

#[async_trait]
impl RawNotificationPublisher for MemoryBus {
    async fn publish_raw(&self, data: &[u8], descriptor: QueueDescriptor) -> EmptyResult {
        self.push_raw(descriptor.key(), data);
        Ok(())
    }
}

impl JsonNotificationPublisher for MemoryBus {}

/// Entry delivered by the in-memory queue provider
pub struct MemoryQueueEntry {
    payload: Vec<u8>,
    acknowledged: Arc<AtomicUsize>,
}

#[async_trait]
impl RawQueueEntry for MemoryQueueEntry {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn acknowledge(&mut self) -> EmptyResult {
        self.acknowledged.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl JsonQueueEntry for MemoryQueueEntry {}

#[async_trait]
impl QueueProvider for MemoryBus {
    type Entry = MemoryQueueEntry;

    async fn consume(
        &self,
        queue: QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        _consumer: &str,
        _batch_size: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError> {
        let key = queue.key().to_owned();
        let start = group.start();
        let group = group.identifier().to_string();
        let idle_timeout = idle_timeout.or(self.idle_timeout);

        self.state.lock().unwrap().join(&key, &group, start);

        let bus = self.clone();
        let stream = stream::unfold(bus, move |bus| {
            let key = key.clone();
            let group = group.clone();

            async move {
                loop {
                    let notified = bus.notify.notified();

                    let next = bus.state.lock().unwrap().next(&key, &group);
                    if let Some(payload) = next {
                        let entry = MemoryQueueEntry {
                            payload,
                            acknowledged: bus.acknowledged.clone(),
                        };

                        drop(notified);
                        return Some((Ok(entry), bus));
                    }

                    match idle_timeout {
                        Some(duration) => timeout(duration, notified).await.ok()?,
                        None => notified.await,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::communication::event::{ConsumerGroupIdentifier, QueueEntry};

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new("numbers".into(), 100)
    }

    fn group(name: &str) -> ConsumerGroupDescriptor {
        ConsumerGroupDescriptor::new(
            ConsumerGroupIdentifier::Other(name.into()),
            QueueLocation::Head,
        )
    }

    async fn drain(bus: &MemoryBus, group: &ConsumerGroupDescriptor) -> Vec<u32> {
        bus.consume(queue(), group, "consumer", 1, None)
            .await
            .unwrap()
            .map(|entry| entry.unwrap().parse_payload::<u32>().unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn deliver_a_copy_to_every_group() {
        let bus = MemoryBus::with_idle_timeout(Duration::from_millis(20));

        for number in 0..3u32 {
            bus.push_raw("numbers", number.to_string().as_bytes());
        }

        assert_eq!(drain(&bus, &group("first")).await, vec![0, 1, 2]);
        assert_eq!(drain(&bus, &group("second")).await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn share_entries_within_a_group() {
        let bus = MemoryBus::with_idle_timeout(Duration::from_millis(20));
        let shared = group("shared");

        for number in 0..10u32 {
            bus.push_raw("numbers", number.to_string().as_bytes());
        }

        let (mut left, right) = futures::join!(drain(&bus, &shared), drain(&bus, &shared));
        left.extend(right);
        left.sort_unstable();

        assert_eq!(left, (0..10).collect::<Vec<u32>>());
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Number(u32);

    impl crate::library::communication::event::Notification for Number {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("numbers".into(), 100)
        }
    }

    #[derive(Default)]
    struct Collector(Mutex<Vec<u32>>);

    #[async_trait]
    impl crate::library::communication::event::Consumer for Collector {
        type Notification = Number;

        async fn consume(&self, notification: Number) -> EmptyResult {
            self.0.lock().unwrap().push(notification.0);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drop_and_acknowledge_malformed_entries() {
        use crate::library::communication::event::{ConsumerExt, NotificationPublisher};

        let bus = MemoryBus::with_idle_timeout(Duration::from_millis(20));
        let collector = Collector::default();

        bus.publish(&Number(1)).await.unwrap();
        bus.push_raw("numbers", b"{ not json");
        bus.publish(&Number(2)).await.unwrap();

        collector
            .consume_queue(bus.clone(), &group("collector"), "consumer")
            .await
            .unwrap();

        let mut consumed = collector.0.lock().unwrap().clone();
        consumed.sort_unstable();

        assert_eq!(consumed, vec![1, 2]);
        assert_eq!(bus.acknowledged(), 3);
    }

    #[tokio::test]
    async fn skip_history_when_starting_at_tail() {
        let bus = MemoryBus::with_idle_timeout(Duration::from_millis(20));
        bus.push_raw("numbers", b"1");

        let tail = ConsumerGroupDescriptor::new(
            ConsumerGroupIdentifier::Other("late".into()),
            QueueLocation::Tail,
        );

        let mut stream = bus
            .consume(queue(), &tail, "consumer", 1, None)
            .await
            .unwrap();
        bus.push_raw("numbers", b"2");

        let entry = stream.next().await.unwrap().unwrap();
        assert_eq!(entry.parse_payload::<u32>().unwrap(), 2);
        assert!(stream.next().await.is_none());
    }
}
