//! Various small helpers that don't belong anywhere else

mod backoff;
mod retry;

pub use backoff::Backoff;
pub use retry::{connect_with_retry, ConnectionError, RetryPolicy};
