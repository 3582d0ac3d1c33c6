use super::{Job, JobManager};
use crate::library::helpers::Backoff;
use futures::{
    channel::oneshot::Receiver as OneShotReceiver,
    future::{abortable, AbortHandle},
    lock::Mutex,
};
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tokio::{
    sync::watch::Sender as WatchSender,
    task::{self, JoinHandle},
    time::{sleep, Instant},
};
use tracing::{debug, error, info, warn};

const TERMINATION_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// State in which a job currently resides
#[derive(Debug)]
pub enum JobStatus {
    /// Job has started and is ready to fulfill contracts. Contains graceful termination handle if supported.
    Ready(Option<WatchSender<bool>>),
    /// Job has never started and is in the process of getting ready
    Startup,
    /// Job crashed and is getting ready again
    Restarting,
    /// Job has exited with an error and is currently waiting before it retries
    CrashLoopBackOff,
    /// Job has exceeded its crash loop limit
    Terminated,
    /// Job has exited cleanly
    Finished,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            JobStatus::Ready(_) => write!(f, "Ready"),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl JobStatus {
    fn is_gracefully_terminatable(&self) -> bool {
        matches!(*self, JobStatus::Ready(Some(_)))
    }
}

type StatusMap = Arc<Mutex<HashMap<String, JobStatus>>>;

/// Job lifecycle handler
#[derive(Default)]
pub struct JobScheduler {
    status: StatusMap,
    termination_handles: Arc<Mutex<HashMap<String, AbortHandle>>>,
}

impl JobScheduler {
    fn add_status_watcher(
        readiness_rx: OneShotReceiver<()>,
        termination_tx: Option<WatchSender<bool>>,
        status_map: StatusMap,
        job_name: String,
    ) -> JoinHandle<()> {
        task::spawn(async move {
            if readiness_rx.await.is_ok() {
                JobScheduler::change_status(&status_map, &job_name, JobStatus::Ready(termination_tx))
                    .await;
            }
        })
    }

    async fn change_status(status_map: &StatusMap, job_name: &str, status: JobStatus) {
        debug!(job = job_name, %status, "Job changed status");
        status_map.lock().await.insert(job_name.to_owned(), status);
    }

    async fn manage_job_lifecycle<J>(job: J, status_map: StatusMap)
    where
        J: Job + Send + Sync + 'static,
    {
        let job_name = job.name();
        let mut backoff = Backoff::default();

        JobScheduler::change_status(&status_map, &job_name, JobStatus::Startup).await;

        loop {
            let (manager, readiness_rx, termination_tx) = JobManager::new();

            let wrapped_termination_tx = if J::SUPPORTS_GRACEFUL_TERMINATION {
                Some(termination_tx)
            } else {
                None
            };

            let status_handle = JobScheduler::add_status_watcher(
                readiness_rx,
                wrapped_termination_tx,
                status_map.clone(),
                job_name.clone(),
            );

            let result = job.execute(manager).await;
            status_handle.abort();

            match result {
                Ok(_) => {
                    JobScheduler::change_status(&status_map, &job_name, JobStatus::Finished).await;
                    status_map.lock().await.remove(&job_name);
                    break;
                }
                Err(error) => {
                    error!(job = %job_name, %error, "Job crashed");
                    JobScheduler::change_status(&status_map, &job_name, JobStatus::CrashLoopBackOff)
                        .await;

                    if let Some(sleep_duration) = backoff.next() {
                        debug!(job = %job_name, ?sleep_duration, "Backing off");
                        sleep(sleep_duration).await;
                    } else {
                        error!(job = %job_name, "Job exceeded its retry limit");
                        JobScheduler::change_status(&status_map, &job_name, JobStatus::Terminated)
                            .await;
                        return;
                    }
                }
            }

            JobScheduler::change_status(&status_map, &job_name, JobStatus::Restarting).await;
        }
    }

    /// Manage a new job
    ///
    /// The job is respawned when it crashes and its lifecycle is tracked so that it can be terminated later on.
    pub async fn spawn_job<J>(&self, job: J)
    where
        J: Job + Send + Sync + 'static,
    {
        let status_map = self.status.clone();
        let termination_handles = self.termination_handles.clone();
        let job_name = job.name();

        let (job_lifecycle, termination_handle) =
            abortable(JobScheduler::manage_job_lifecycle(job, status_map.clone()));

        termination_handles
            .lock()
            .await
            .insert(job_name.clone(), termination_handle);

        task::spawn(async move {
            if job_lifecycle.await.is_err() {
                JobScheduler::change_status(&status_map, &job_name, JobStatus::Terminated).await;
            }

            termination_handles.lock().await.remove(&job_name);
            status_map.lock().await.remove(&job_name);
        });
    }

    /// Current status of a job or `None` if it is not (or no longer) managed
    pub async fn status(&self, job_name: &str) -> Option<String> {
        self.status
            .lock()
            .await
            .get(job_name)
            .map(|status| status.to_string())
    }

    /// Gracefully terminates all managed jobs that support it and aborts the remaining ones after the grace period
    pub async fn terminate_jobs(&self, grace_period: Duration) {
        // 1. Send termination signal to jobs that support graceful shutdown and abort ones that don't
        {
            let status = self.status.lock().await;
            let termination_handles = self.termination_handles.lock().await;

            for (job_name, handle) in termination_handles.iter() {
                match status.get(job_name) {
                    Some(JobStatus::Ready(Some(graceful_handle))) => {
                        graceful_handle.send(true).ok();
                    }
                    _ => handle.abort(),
                }
            }
        }

        // 2. Give alive jobs some time to gracefully terminate
        let deadline = Instant::now() + grace_period;
        while Instant::now() < deadline {
            {
                let status = self.status.lock().await;
                let termination_handles = self.termination_handles.lock().await;

                let pending = termination_handles.keys().any(|job_name| {
                    status
                        .get(job_name)
                        .map(JobStatus::is_gracefully_terminatable)
                        .unwrap_or(false)
                });

                if !pending {
                    break;
                }
            }

            sleep(TERMINATION_POLL_INTERVAL).await;
        }

        // 3. Abort everything that is left
        for (job_name, handle) in self.termination_handles.lock().await.iter() {
            warn!(job = %job_name, "Job ignored graceful termination request");
            handle.abort()
        }

        info!("All jobs terminated");
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::EmptyResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::task::yield_now;

    struct FlakyJob {
        executions: Arc<AtomicUsize>,
        failures: usize,
    }

    #[async_trait]
    impl Job for FlakyJob {
        const NAME: &'static str = "FlakyJob";

        async fn execute(&self, _manager: JobManager) -> EmptyResult {
            let execution = self.executions.fetch_add(1, Ordering::SeqCst);

            if execution < self.failures {
                Err("induced failure".into())
            } else {
                Ok(())
            }
        }
    }

    struct GracefulJob {
        terminated: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Job for GracefulJob {
        const NAME: &'static str = "GracefulJob";
        const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

        async fn execute(&self, manager: JobManager) -> EmptyResult {
            manager.ready().await;
            manager.termination_signal().await;
            self.terminated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restart_crashed_jobs() {
        let executions = Arc::new(AtomicUsize::new(0));
        let scheduler = JobScheduler::default();

        scheduler
            .spawn_job(FlakyJob {
                executions: executions.clone(),
                failures: 2,
            })
            .await;

        sleep(Duration::from_secs(1)).await;

        assert_eq!(executions.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.status(FlakyJob::NAME).await, None);
    }

    #[tokio::test]
    async fn terminate_gracefully() {
        let terminated = Arc::new(AtomicUsize::new(0));
        let scheduler = JobScheduler::default();

        scheduler
            .spawn_job(GracefulJob {
                terminated: terminated.clone(),
            })
            .await;

        while scheduler.status(GracefulJob::NAME).await != Some("Ready".into()) {
            yield_now().await;
        }

        scheduler.terminate_jobs(Duration::from_secs(5)).await;

        assert_eq!(terminated.load(Ordering::SeqCst), 1);
    }
}
