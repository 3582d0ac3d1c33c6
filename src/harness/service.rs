use super::RedisCommunicationFactory;
use crate::library::communication::event::{ConsumerExt, ConsumerGroupDescriptor};
use crate::library::communication::CommunicationFactory;
use crate::library::scheduling::{Job, JobManager};
use crate::library::EmptyResult;
use async_trait::async_trait;
use thiserror::Error;

/// Consumer that is built from a [`CommunicationFactory`] and static configuration
pub trait Service<F: CommunicationFactory + Send + Sync> {
    /// Name used in logs and as part of the scheduled job name
    const NAME: &'static str;
    /// Type doing the actual work
    type Instance: Send + Sync;
    /// Shared configuration handed to every instance
    type Config: Send + Sync;

    /// Builds a fresh instance
    fn instantiate(factory: F, config: &Self::Config) -> Self::Instance;
}

#[derive(Debug, Error)]
enum ServiceRunnerError {
    #[error("notification stream of {0} ended unexpectedly")]
    StreamEnded(&'static str),
}

/// Job that keeps a [`Service`] consuming its queue for the lifetime of the process
pub struct ServiceRunner<S: Service<RedisCommunicationFactory>> {
    factory: RedisCommunicationFactory,
    group: ConsumerGroupDescriptor,
    consumer: String,
    config: <S as Service<RedisCommunicationFactory>>::Config,
}

impl<S> ServiceRunner<S>
where
    S: Service<RedisCommunicationFactory>,
    S::Instance: ConsumerExt + Send + Sync,
{
    /// Runner joining `group` under the name `consumer`
    pub fn new(
        factory: RedisCommunicationFactory,
        group: ConsumerGroupDescriptor,
        consumer: String,
        config: <S as Service<RedisCommunicationFactory>>::Config,
    ) -> Self {
        Self {
            factory,
            group,
            consumer,
            config,
        }
    }
}

#[async_trait]
impl<S> Job for ServiceRunner<S>
where
    S: Service<RedisCommunicationFactory> + Send + Sync,
    S::Instance: ConsumerExt,
{
    const NAME: &'static str = "ServiceRunner";

    fn name(&self) -> String {
        format!("{}({})", Self::NAME, S::NAME)
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let provider = self.factory.queue_provider();
        let service = S::instantiate(self.factory.clone(), &self.config);

        manager.ready().await;

        service
            .consume_queue(provider, &self.group, &self.consumer)
            .await?;

        // Queues are consumed without an idle timeout so returning means the connection broke
        Err(ServiceRunnerError::StreamEnded(S::NAME).into())
    }
}
