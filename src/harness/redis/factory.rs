use super::connection::{RedisConnection, SharedConnection, SharedSlot};
use crate::library::communication::implementation::redis::{
    RedisConnectionVariant, RedisFactory, RedisPublisher, RedisQueueProvider,
};
use crate::library::communication::CommunicationFactory;
use crate::library::helpers::{connect_with_retry, ConnectionError, RetryPolicy};
use crate::library::BoxedError;
use async_trait::async_trait;
use redis::{Client, RedisResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const SERVICE_NAME: &str = "redis";

/// [`RedisFactory`] which connects with a bounded [`RetryPolicy`] and shares one multiplexed connection between clones
#[derive(Clone)]
pub struct SharedRedisFactory {
    client: Client,
    policy: RetryPolicy,
    shared: SharedSlot,
}

impl SharedRedisFactory {
    /// Creates a new factory for the given URL without connecting to it
    pub fn new(url: &str, policy: RetryPolicy) -> RedisResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
            policy,
            shared: Arc::new(Mutex::new(Default::default())),
        })
    }

    /// Creates a new factory and verifies that the server is reachable, giving up once the policy is exhausted
    pub async fn connect(url: &str, policy: RetryPolicy) -> Result<Self, BoxedError> {
        let factory = Self::new(url, policy)?;
        factory.ping().await?;
        info!(url, "Connected to message bus");

        Ok(factory)
    }

    /// Sends a `PING` over the shared connection
    pub async fn ping(&self) -> Result<(), ConnectionError> {
        connect_with_retry(SERVICE_NAME, self.policy, || async {
            let mut con = self.multiplexed().await?;
            redis::cmd("PING").query_async::<_, String>(&mut con).await
        })
        .await?;

        Ok(())
    }

    /// Clones the shared connection, establishing it with a single attempt if the slot is empty
    async fn multiplexed(&self) -> RedisResult<RedisConnection> {
        let mut slot = self.shared.lock().await;

        let (generation, con) = match slot.current() {
            Some(current) => current,
            None => {
                let con = self.client.get_multiplexed_tokio_connection().await?;
                (slot.replace(con.clone()), con)
            }
        };

        Ok(RedisConnection::Multiplexed(SharedConnection::new(
            con,
            self.shared.clone(),
            generation,
        )))
    }
}

#[async_trait]
impl RedisFactory for SharedRedisFactory {
    type Connection = RedisConnection;

    async fn connection(
        &self,
        variant: RedisConnectionVariant,
    ) -> Result<Self::Connection, BoxedError> {
        match variant {
            RedisConnectionVariant::Owned => {
                let con = connect_with_retry(SERVICE_NAME, self.policy, || {
                    self.client.get_async_connection()
                })
                .await?;

                Ok(RedisConnection::Owned(con))
            }
            RedisConnectionVariant::Multiplexed => {
                let con = connect_with_retry(SERVICE_NAME, self.policy, || self.multiplexed())
                    .await?;

                Ok(con)
            }
        }
    }
}

/// Communication factory based on [`SharedRedisFactory`]
#[derive(Clone)]
pub struct RedisCommunicationFactory {
    factory: SharedRedisFactory,
}

impl RedisCommunicationFactory {
    /// Creates a new instance drawing its connections from the given factory
    pub fn new(factory: SharedRedisFactory) -> Self {
        Self { factory }
    }
}

impl CommunicationFactory for RedisCommunicationFactory {
    type QueueProvider = RedisQueueProvider<SharedRedisFactory>;
    type NotificationPublisher = RedisPublisher<SharedRedisFactory>;

    fn queue_provider(&self) -> Self::QueueProvider {
        Self::QueueProvider::new(self.factory.clone())
    }

    fn notification_publisher(&self) -> Self::NotificationPublisher {
        Self::NotificationPublisher::new(self.factory.clone())
    }
}
