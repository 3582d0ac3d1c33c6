use crate::library::BoxedError;
use async_trait::async_trait;
use redis::aio::ConnectionLike;

/// Variant for redis connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisConnectionVariant {
    /// Individual connection that may be used for blocking commands without disturbing other users.
    /// It indicates that the consumer is operating long-running, blocking operations on the connection.
    Owned,
    /// Connection that can be shared between multiple users and generally does not permit blocking commands
    Multiplexed,
}

/// Factory for redis connections of different [types](RedisConnectionVariant)
#[async_trait]
pub trait RedisFactory: Clone {
    /// Connection type handed out by the factory
    type Connection: ConnectionLike + Send + Sync + 'static;

    /// Establishes a new connection or clones a shared one
    async fn connection(
        &self,
        variant: RedisConnectionVariant,
    ) -> Result<Self::Connection, BoxedError>;
}
