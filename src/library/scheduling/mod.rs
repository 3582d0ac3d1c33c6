//! Job handling and scheduling structs
//!
//! Long running units of work are expressed as [`Job`] implementations and handed to a
//! [`JobScheduler`] which restarts them with a backoff when they crash and terminates
//! them gracefully (if they support it) when the process shuts down.

mod job;
mod job_manager;
mod job_scheduler;

pub use job::Job;
pub use job_manager::JobManager;
pub use job_scheduler::{JobScheduler, JobStatus};

/// Schedule jobs on a given scheduler
#[macro_export]
macro_rules! schedule {
    ($scheduler:expr, { $($job:ident$(,)? )+ }) => {
        $(
            $scheduler.spawn_job($job).await;
        )+
    };
}
