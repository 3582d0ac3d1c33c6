use super::QueueLocation;
use std::fmt;

/// Name of a consumer group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerGroupIdentifier {
    /// Instances forwarding task events to an external channel
    Broadcaster,
    /// Any other group, used by tooling and tests
    Other(String),
}

impl fmt::Display for ConsumerGroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcaster => write!(f, "broadcaster"),
            Self::Other(identifier) => write!(f, "{}", identifier),
        }
    }
}

/// Consumer group to join when reading a queue
///
/// Members of one group split the entries of a queue between them while
/// every group sees all entries.
#[derive(Debug, Clone)]
pub struct ConsumerGroupDescriptor {
    identifier: ConsumerGroupIdentifier,
    start: QueueLocation,
}

impl ConsumerGroupDescriptor {
    /// Group named `identifier` starting at `start` when first created
    pub fn new(identifier: ConsumerGroupIdentifier, start: QueueLocation) -> Self {
        Self { identifier, start }
    }

    /// Name of the group
    pub fn identifier(&self) -> &ConsumerGroupIdentifier {
        &self.identifier
    }

    /// Starting position, only honored when the group does not exist yet
    pub fn start(&self) -> QueueLocation {
        self.start
    }
}

impl Default for ConsumerGroupDescriptor {
    /// Broadcaster group reading only entries appended after it was created
    fn default() -> Self {
        Self {
            identifier: ConsumerGroupIdentifier::Broadcaster,
            start: QueueLocation::Tail,
        }
    }
}
