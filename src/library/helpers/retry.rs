//! Bounded retries for establishing connections to backing services

use super::Backoff;
use crate::library::BoxedError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

const DEFAULT_ATTEMPTS: u32 = 10;
const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound of connection attempts and the pause in between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    /// Creates a new policy, at least one attempt is always made
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            interval,
        }
    }

    /// Policy which makes exactly one attempt
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Maximum number of attempts
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn backoff(&self) -> Backoff {
        Backoff::fixed(self.interval, self.attempts - 1)
    }
}

impl Default for RetryPolicy {
    /// Ten attempts, five seconds apart
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

/// Error returned when a backing service stays unreachable
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Every attempt permitted by the [`RetryPolicy`] failed
    #[error("unable to connect to {service} after {attempts} attempts")]
    Exhausted {
        /// Name of the backing service
        service: String,
        /// Number of attempts that have been made
        attempts: u32,
        /// Error of the last attempt
        #[source]
        source: BoxedError,
    },
}

/// Repeatedly calls `attempt` until it succeeds or the policy is exhausted.
///
/// Each failed attempt is reported as a warning before pausing for the policy interval.
/// The error of the final attempt is wrapped in [`ConnectionError::Exhausted`] and is
/// meant to be treated as fatal by the caller.
pub async fn connect_with_retry<T, E, F, Fut>(
    service: &str,
    policy: RetryPolicy,
    mut attempt: F,
) -> Result<T, ConnectionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxedError>,
{
    let mut pauses = policy.backoff();
    let mut number = 1;

    loop {
        debug!(service, attempt = number, "Connecting");

        match attempt().await {
            Ok(connection) => {
                debug!(service, attempt = number, "Connection established");
                return Ok(connection);
            }
            Err(error) => {
                let error: BoxedError = error.into();

                warn!(
                    service,
                    attempt = number,
                    max_attempts = policy.attempts(),
                    %error,
                    "Connection attempt failed"
                );

                match pauses.next() {
                    Some(pause) => {
                        sleep(pause).await;
                        number += 1;
                    }
                    None => {
                        return Err(ConnectionError::Exhausted {
                            service: service.to_owned(),
                            attempts: number,
                            source: error,
                        })
                    }
                }
            }
        }
    }
}
