use chrono::{DateTime, Utc};

/// Source of the current time
pub trait Clock {
    /// Current point in time
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
