use super::QueueDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Message announcing that something happened, bound to exactly one queue
///
/// The serde representation is the wire format.
pub trait Notification: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Queue the notification is appended to and read from
    fn queue() -> QueueDescriptor;
}
