//! Process signal handling. The first Ctrl+C or SIGTERM drains in-flight
//! requests; a second one forces the process out.

use std::{future::pending, time::Duration};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShutdownStage {
    Running,
    Draining,
    Forced,
}

impl ShutdownStage {
    fn escalated(self) -> Self {
        match self {
            ShutdownStage::Running => ShutdownStage::Draining,
            ShutdownStage::Draining | ShutdownStage::Forced => ShutdownStage::Forced,
        }
    }
}

/// Moves the shared stage forward one step per received signal.
pub struct ShutdownTrigger {
    tx: watch::Sender<ShutdownStage>,
}

impl ShutdownTrigger {
    pub fn escalate(&self) -> ShutdownStage {
        let mut reached = ShutdownStage::Running;
        self.tx.send_modify(|stage| {
            *stage = stage.escalated();
            reached = *stage;
        });
        reached
    }
}

#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<ShutdownStage>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(ShutdownStage::Running);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// Subscribes to the process signals on a background task.
    pub fn listen() -> Shutdown {
        let (trigger, shutdown) = Self::channel();
        tokio::spawn(forward_signals(trigger));
        shutdown
    }

    pub fn stage(&self) -> ShutdownStage {
        *self.rx.borrow()
    }

    /// Resolves once `stage` is reached. Never resolves if signals stop
    /// arriving before that.
    pub async fn reached(&self, stage: ShutdownStage) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|current| *current >= stage).await.is_err() {
            pending::<()>().await;
        }
    }

    pub async fn draining(self) {
        self.reached(ShutdownStage::Draining).await;
    }

    pub async fn forced(&self) {
        self.reached(ShutdownStage::Forced).await;
    }

    /// Resolves `grace` after draining started.
    pub async fn grace_expired(&self, grace: Duration) {
        self.reached(ShutdownStage::Draining).await;
        tokio::time::sleep(grace).await;
    }
}

async fn forward_signals(trigger: ShutdownTrigger) {
    #[cfg(unix)]
    let mut terminate =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                None
            }
        };

    loop {
        #[cfg(unix)]
        let received = tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = next_terminate(&mut terminate) => Ok(()),
        };
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c().await;

        if let Err(err) = received {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            return;
        }
        match trigger.escalate() {
            ShutdownStage::Forced => {
                tracing::warn!("Second shutdown signal received, forcing exit");
                return;
            }
            _ => tracing::info!(
                "Shutdown signal received, draining requests (signal again to force)"
            ),
        }
    }
}

#[cfg(unix)]
async fn next_terminate(stream: &mut Option<tokio::signal::unix::Signal>) {
    match stream {
        Some(stream) => {
            if stream.recv().await.is_none() {
                pending::<()>().await
            }
        }
        None => pending::<()>().await,
    }
}
