//! Test doubles for the communication layer

mod factory;
mod notification_publisher;
mod queue_provider;

pub use factory::*;
pub use notification_publisher::*;
pub use queue_provider::*;
