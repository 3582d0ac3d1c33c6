//! Owns the task list and announces every mutation on the message bus

mod article;
mod options;
mod publisher;
mod server;
mod store;

use crate::harness::{Heart, Module, RedisCommunicationFactory, SharedRedisFactory};
use crate::library::communication::CommunicationFactory;
use crate::library::helpers::RetryPolicy;
use crate::library::scheduling::JobScheduler;
use crate::library::{BoxedError, EmptyResult};
use crate::schedule;
use article::HttpArticleSource;
use async_trait::async_trait;
use publisher::TaskEventPublisher;
use server::{ServerJob, TodoContext};
use store::PgTaskStore;
use tracing::{info, warn};

pub use options::Options;

type BusPublisher = <RedisCommunicationFactory as CommunicationFactory>::NotificationPublisher;

/// Module implementation
pub struct Todo {
    options: Options,
    store: Option<PgTaskStore>,
}

impl Todo {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            store: None,
        }
    }

    fn build_publisher(&self) -> Result<TaskEventPublisher<BusPublisher>, BoxedError> {
        let publisher = match &self.options.bus_url {
            Some(url) => {
                // Publishing happens inline with requests thus connection attempts are not retried
                let factory = SharedRedisFactory::new(url, RetryPolicy::once())?;
                Some(RedisCommunicationFactory::new(factory).notification_publisher())
            }
            None => {
                warn!("Message bus is not configured, task events will not be published");
                None
            }
        };

        Ok(TaskEventPublisher::new(publisher))
    }
}

#[async_trait]
impl Module for Todo {
    async fn pre_startup(&mut self) -> EmptyResult {
        let connect_options = self.options.database.connect_options();
        let store = PgTaskStore::connect(connect_options, RetryPolicy::default()).await?;

        self.store = Some(store);

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let store = self
            .store
            .take()
            .ok_or("database connection was not established")?;
        let publisher = self.build_publisher()?;
        let articles = HttpArticleSource::new(self.options.random_article_url.clone())?;

        let context = TodoContext::new(store, publisher, articles);
        let server_job = ServerJob::new(
            self.options.server.port,
            self.options.server.cors(),
            context,
        );

        info!(port = self.options.server.port, "Starting todo service");
        schedule!(scheduler, { server_job });

        let (heart, _) = Heart::new();
        Ok(Some(heart))
    }
}
