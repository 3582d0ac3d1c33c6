//! Forwards task events from the message bus to a chat webhook

mod handler;
mod options;
mod services;
mod webhook;

use crate::domain::event::{TaskCreatedNotification, TaskUpdatedNotification};
use crate::domain::DeliveryMode;
use crate::harness::{
    Heart, Module, RedisCommunicationFactory, ServiceRunner, SharedRedisFactory,
};
use crate::library::communication::event::ConsumerGroupDescriptor;
use crate::library::helpers::RetryPolicy;
use crate::library::scheduling::JobScheduler;
use crate::library::{BoxedError, EmptyResult};
use crate::schedule;
use async_trait::async_trait;
use handler::{select_handler, SharedEventHandler};
use services::TaskEventListenerService;
use tracing::info;
use webhook::HttpWebhookClient;

pub use options::Options;

type CreatedListener = TaskEventListenerService<TaskCreatedNotification>;
type UpdatedListener = TaskEventListenerService<TaskUpdatedNotification>;

/// Module implementation
pub struct Broadcaster {
    options: Options,
    handler: Option<SharedEventHandler>,
    factory: Option<SharedRedisFactory>,
}

impl Broadcaster {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            handler: None,
            factory: None,
        }
    }

    fn build_handler(&self, mode: DeliveryMode) -> Result<SharedEventHandler, BoxedError> {
        let webhook = match self.options.webhook_url.as_deref() {
            Some(url) if !url.is_empty() && mode == DeliveryMode::Forward => {
                Some(HttpWebhookClient::new(url.to_owned())?)
            }
            _ => None,
        };

        Ok(select_handler(mode, webhook)?)
    }
}

#[async_trait]
impl Module for Broadcaster {
    async fn pre_startup(&mut self) -> EmptyResult {
        let mode = DeliveryMode::resolve(self.options.mode.as_deref());
        let handler = self.build_handler(mode)?;

        let factory =
            SharedRedisFactory::connect(&self.options.bus.url, RetryPolicy::default()).await?;

        info!(%mode, "Broadcaster configured");

        self.handler = Some(handler);
        self.factory = Some(factory);

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let handler = self
            .handler
            .take()
            .ok_or("event handler was not configured")?;
        let factory = self
            .factory
            .take()
            .map(RedisCommunicationFactory::new)
            .ok_or("message bus connection was not established")?;

        let consumer = self.options.queueing.consumer_id();
        let group = ConsumerGroupDescriptor::default();

        let created_runner = ServiceRunner::<CreatedListener>::new(
            factory.clone(),
            group.clone(),
            consumer.clone(),
            handler.clone(),
        );
        let updated_runner =
            ServiceRunner::<UpdatedListener>::new(factory, group, consumer.clone(), handler);

        info!(%consumer, "Listening for task events");
        schedule!(scheduler, {
            created_runner,
            updated_runner
        });

        let (heart, _) = Heart::new();
        Ok(Some(heart))
    }
}
