use super::super::handler::SharedEventHandler;
use crate::domain::event::TaskNotification;
use crate::harness::Service;
use crate::library::communication::event::Consumer;
use crate::library::communication::CommunicationFactory;
use crate::library::EmptyResult;
use async_trait::async_trait;
use std::any::type_name;
use std::marker::PhantomData;
use tracing::{instrument, warn};

/// Passes task events of one kind to the configured handler
///
/// Consumes:
/// - `N`, either [`TaskCreatedNotification`](crate::domain::event::TaskCreatedNotification)
///   or [`TaskUpdatedNotification`](crate::domain::event::TaskUpdatedNotification)
///
/// Handler failures are logged and the event is acknowledged regardless, delivery is never retried.
pub struct TaskEventListenerService<N> {
    handler: SharedEventHandler,
    phantom: PhantomData<fn() -> N>,
}

impl<F, N> Service<F> for TaskEventListenerService<N>
where
    F: CommunicationFactory + Send + Sync,
    N: TaskNotification + Send + Sync,
{
    // Runners are scheduled per event kind and need distinct names
    const NAME: &'static str = N::LABEL;
    type Instance = TaskEventListenerService<N>;
    type Config = SharedEventHandler;

    fn instantiate(_factory: F, handler: &Self::Config) -> Self::Instance {
        Self {
            handler: handler.clone(),
            phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<N> Consumer for TaskEventListenerService<N>
where
    N: TaskNotification + Send + Sync,
{
    type Notification = N;

    #[instrument(skip(self, notification), fields(event = N::LABEL, id = %notification.task().id))]
    async fn consume(&self, notification: N) -> EmptyResult {
        if let Err(error) = self.handler.handle(N::LABEL, notification.task()).await {
            warn!(notification_type = type_name::<N>(), %error, "Failed to handle task event");
        }

        Ok(())
    }
}
