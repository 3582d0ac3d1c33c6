use crate::library::communication::event::{Notification, NotificationPublisher};
use crate::library::EmptyResult;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Notification as it would appear on the wire
#[derive(Debug, PartialEq)]
struct Published {
    queue: String,
    payload: Value,
}

impl Published {
    fn new<N: Notification>(notification: &N) -> Self {
        Self {
            queue: N::queue().key().to_owned(),
            payload: serde_json::to_value(notification)
                .expect("notification could not be converted to JSON"),
        }
    }
}

/// Publisher which asserts that exactly the expected notifications are published, in order
///
/// Dropping it while expectations are outstanding fails the test.
#[derive(Default)]
pub struct MockNotificationPublisher {
    expected: Mutex<VecDeque<Published>>,
}

impl MockNotificationPublisher {
    /// Registers a notification that has to be published next
    pub fn expect<N: Notification + Send + Sync>(&self, notification: &N) -> &Self {
        let expected = Published::new(notification);
        debug!(queue = %expected.queue, payload = %expected.payload, "Expecting notification");

        self.expected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(expected);
        self
    }

    /// Number of expected notifications that have not been published yet
    pub fn remaining(&self) -> usize {
        self.expected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn verify(&self, actual: Published) {
        debug!(queue = %actual.queue, payload = %actual.payload, "Received notification");

        let next = self
            .expected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(expected) => assert_eq!(expected, actual, "published notification differs"),
            None => panic!(
                "unexpected notification published to {}: {}",
                actual.queue, actual.payload
            ),
        }
    }
}

#[async_trait]
impl NotificationPublisher for Arc<MockNotificationPublisher> {
    async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> EmptyResult {
        self.verify(Published::new(notification));
        Ok(())
    }
}

impl Drop for MockNotificationPublisher {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        let remaining = self.remaining();
        if remaining > 0 {
            panic!("{} expected notifications were never published", remaining);
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::library::communication::event::QueueDescriptor;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Reminder {
        text: String,
        urgent: bool,
    }

    impl Notification for Reminder {
        fn queue() -> QueueDescriptor {
            QueueDescriptor::new("reminder".into(), 10)
        }
    }

    fn reminder(text: &str) -> Reminder {
        Reminder {
            text: text.into(),
            urgent: false,
        }
    }

    #[tokio::test]
    async fn accept_expected_notifications_in_order() {
        let publisher = Arc::new(MockNotificationPublisher::default());
        publisher.expect(&reminder("first")).expect(&reminder("second"));

        publisher.publish(&reminder("first")).await.unwrap();
        assert_eq!(publisher.remaining(), 1);

        publisher.publish(&reminder("second")).await.unwrap();
        assert_eq!(publisher.remaining(), 0);
    }

    #[tokio::test]
    #[should_panic]
    async fn reject_different_content() {
        let publisher = Arc::new(MockNotificationPublisher::default());
        publisher.expect(&reminder("water plants"));

        publisher.publish(&reminder("buy milk")).await.unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn reject_different_queues() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Chore {
            text: String,
            urgent: bool,
        }

        impl Notification for Chore {
            fn queue() -> QueueDescriptor {
                QueueDescriptor::new("chore".into(), 10)
            }
        }

        let publisher = Arc::new(MockNotificationPublisher::default());
        publisher.expect(&reminder("water plants"));

        let chore = Chore {
            text: "water plants".into(),
            urgent: false,
        };

        publisher.publish(&chore).await.unwrap();
    }

    #[test]
    fn stay_usable_after_a_mismatch() {
        let publisher = MockNotificationPublisher::default();
        publisher
            .expect(&reminder("water plants"))
            .expect(&reminder("buy milk"));

        let mismatch = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            publisher.verify(Published::new(&reminder("feed cat")));
        }));

        assert!(mismatch.is_err());
        assert_eq!(publisher.remaining(), 1);

        publisher.verify(Published::new(&reminder("buy milk")));
        assert_eq!(publisher.remaining(), 0);
    }

    #[test]
    fn tolerate_a_poisoned_lock() {
        let publisher = MockNotificationPublisher::default();
        publisher.expect(&reminder("water plants"));

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _expected = publisher.expected.lock().unwrap();
            panic!("failed while holding the expectations");
        }));

        assert!(poisoned.is_err());
        assert_eq!(publisher.remaining(), 1);
        publisher.verify(Published::new(&reminder("water plants")));
    }

    #[tokio::test]
    #[should_panic]
    async fn reject_unexpected_notifications() {
        let publisher = Arc::new(MockNotificationPublisher::default());
        publisher.publish(&reminder("surprise")).await.unwrap();
    }

    #[test]
    #[should_panic]
    fn reject_missing_notifications() {
        MockNotificationPublisher::default().expect(&reminder("never sent"));
    }
}
