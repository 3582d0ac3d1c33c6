//! Structures to keep the process alive until some event occurs

use futures::{
    channel::mpsc::{channel, Receiver, Sender},
    prelude::*,
    select,
};
use std::fmt::{self, Formatter};
use tokio::signal::ctrl_c;
use tracing::{debug, error, warn};

/// Reason why the heart stopped beating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathReason {
    /// Internal kill signal has been sent
    Killed(String),
    /// SIGINT, SIGTERM or other process-external cause
    Terminated,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, w: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Killed(reason) => write!(w, "Killed ({})", reason),
            DeathReason::Terminated => write!(w, "Terminated due to external signal"),
        }
    }
}

/// Lifecycle management struct that can be used to keep the application alive
pub struct Heart {
    rx: Receiver<String>,
}

impl Heart {
    /// Creates a new heart and linked stone
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, HeartStone) {
        let (tx, rx) = channel(2);
        (Self { rx }, HeartStone { remote: tx })
    }

    /// Future that waits until the heart dies for the returned reason
    pub async fn death(&mut self) -> DeathReason {
        debug!("Heart starts beating");

        select! {
            reason = self.rx.next() => match reason {
                Some(reason) => DeathReason::Killed(reason),
                // Every stone has been dropped so only an external signal remains
                None => {
                    Heart::termination_signal().await;
                    DeathReason::Terminated
                }
            },
            () = Heart::termination_signal().fuse() => DeathReason::Terminated,
        }
    }

    #[cfg(unix)]
    async fn termination_signal() {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                select! {
                    _ = sigterm.recv().fuse() => {},
                    _ = ctrl_c().fuse() => {},
                }
            }
            Err(error) => {
                warn!(%error, "Unable to listen for SIGTERM, falling back to ctrl-c");
                ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    async fn termination_signal() {
        ctrl_c().await.ok();
    }
}

/// Remote controller for the heart
#[derive(Clone)]
pub struct HeartStone {
    remote: Sender<String>,
}

impl HeartStone {
    /// Kill the associated heart
    pub async fn kill(&mut self, reason: String) {
        if let Err(e) = self.remote.send(reason).await {
            error!(error = %e, "Failed to interact with Heart");
        }
    }
}
