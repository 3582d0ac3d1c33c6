//! Structures to communicate between services in a distributed system
//!
//! Services communicate by publishing and subscribing to event notifications.
//! Whenever something noteworthy happens in the system (e.g. a task has been created),
//! a notification describing what happened will be published. The notification data
//! structure implements the [`Notification`](event::Notification) trait and thus
//! describes where to expect it in a type-safe manner.
//!
//! Everybody can publish notifications and all interested parties can listen in and
//! react to them. For more details and a more in-depth explanation, consult the [`event`] module.

mod communication_factory;

pub mod event;
pub mod implementation;

pub use communication_factory::CommunicationFactory;
