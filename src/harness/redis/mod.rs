mod connection;
mod factory;

pub use connection::{RedisConnection, SharedConnection};
pub use factory::{RedisCommunicationFactory, SharedRedisFactory};
