use crate::domain::event::TaskNotification;
use crate::domain::Task;
use crate::library::communication::event::NotificationPublisher;
use tracing::{debug, error, warn};

/// Announces persisted mutations on the message bus
///
/// Publishing is fire-and-forget: failures are logged and never reach the caller.
pub struct TaskEventPublisher<P> {
    publisher: Option<P>,
}

impl<P> TaskEventPublisher<P>
where
    P: NotificationPublisher + Send + Sync,
{
    /// Creates a new instance, `None` disables publishing altogether
    pub fn new(publisher: Option<P>) -> Self {
        Self { publisher }
    }

    /// Publishes a snapshot of the task as notification `N`
    pub async fn announce<N>(&self, task: &Task)
    where
        N: TaskNotification + Send + Sync,
    {
        let publisher = match &self.publisher {
            Some(publisher) => publisher,
            None => {
                warn!(event = N::LABEL, "Message bus is not configured, skipping notification");
                return;
            }
        };

        let queue = N::queue();
        let notification = N::from(task.clone());

        match publisher.publish(&notification).await {
            Ok(_) => debug!(queue = queue.key(), id = %task.id, "Published notification"),
            Err(error) => {
                error!(queue = queue.key(), id = %task.id, %error, "Failed to publish notification")
            }
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::event::{TaskCreatedNotification, TaskUpdatedNotification};
    use crate::domain::TaskIdentifier;
    use crate::library::communication::event::{Notification, QueueDescriptor};
    use crate::library::communication::implementation::mock::MockNotificationPublisher;
    use crate::library::EmptyResult;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct UnreachablePublisher;

    #[async_trait]
    impl NotificationPublisher for UnreachablePublisher {
        async fn publish<N: Notification + Send + Sync>(&self, _notification: &N) -> EmptyResult {
            Err("connection refused".into())
        }
    }

    fn task() -> Task {
        Task {
            id: TaskIdentifier::new(1),
            description: "buy milk".into(),
            done: false,
        }
    }

    #[tokio::test]
    async fn publish_to_the_event_queue() {
        let mock = Arc::new(MockNotificationPublisher::default());
        mock.expect(&TaskCreatedNotification(task()));

        TaskEventPublisher::new(Some(mock.clone()))
            .announce::<TaskCreatedNotification>(&task())
            .await;

        assert_eq!(mock.remaining(), 0);
        assert_eq!(
            TaskCreatedNotification::queue(),
            QueueDescriptor::new("task.created".into(), 10_000)
        );
    }

    #[tokio::test]
    async fn swallow_publish_failures() {
        TaskEventPublisher::new(Some(UnreachablePublisher))
            .announce::<TaskUpdatedNotification>(&task())
            .await;
    }

    #[tokio::test]
    async fn skip_without_bus() {
        TaskEventPublisher::<UnreachablePublisher>::new(None)
            .announce::<TaskCreatedNotification>(&task())
            .await;
    }
}
