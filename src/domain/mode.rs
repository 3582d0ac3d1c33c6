use std::fmt;
use tracing::warn;

/// What the broadcaster does with consumed task events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Events are logged and nothing else
    LogOnly,
    /// Events are forwarded to a webhook
    Forward,
}

impl DeliveryMode {
    /// Resolves the mode from its configured value
    ///
    /// Missing or unknown values fall back to [`DeliveryMode::LogOnly`] with a warning.
    pub fn resolve(value: Option<&str>) -> Self {
        match value {
            Some("forward") => DeliveryMode::Forward,
            Some("log-only") => DeliveryMode::LogOnly,
            Some(unknown) => {
                warn!(mode = unknown, "Unknown mode, defaulting to log-only");
                DeliveryMode::LogOnly
            }
            None => {
                warn!("Mode is not set, defaulting to log-only");
                DeliveryMode::LogOnly
            }
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::LogOnly => write!(f, "log-only"),
            DeliveryMode::Forward => write!(f, "forward"),
        }
    }
}
