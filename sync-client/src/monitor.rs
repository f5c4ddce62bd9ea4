//! Background connectivity monitor.
//!
//! Periodically probes the backend, publishes the result for the offline
//! indicator and pending badge, and drains the queue whenever the backend
//! is reachable.

use crate::gateway::BackendGateway;
use crate::service::SyncService;
use cleanout_sync_core::{ConnectivityState, Transition};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Latest connectivity check, as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityStatus {
    /// Backend answered its health check.
    pub online: bool,
    /// Operations waiting to be replayed.
    pub pending: usize,
}

/// Handle to a running monitor.
///
/// Dropping the handle stops the monitor after its current check.
#[derive(Debug)]
pub struct MonitorHandle {
    status: watch::Receiver<ConnectivityStatus>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Status from the most recent check.
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    /// A receiver notified after every check.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.clone()
    }

    /// Stop the monitor and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!("connectivity monitor task failed: {}", e);
        }
    }
}

/// Spawn a background connectivity monitor.
///
/// The first check runs immediately, then once per `every`.
pub fn spawn_connectivity_monitor<G>(service: Arc<SyncService<G>>, every: Duration) -> MonitorHandle
where
    G: BackendGateway + 'static,
{
    let (status_tx, status_rx) = watch::channel(ConnectivityStatus::default());
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        tracing::info!(
            "connectivity monitor started (interval: {}s)",
            every.as_secs()
        );

        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut state = ConnectivityState::new();

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = timer.tick() => {}
            }

            let (status, report) = service.refresh().await;
            let (next, transition) = state.observe(status.online);
            state = next;

            match transition {
                Some(Transition::CameOnline) => {
                    tracing::info!(pending = status.pending, "backend reachable");
                }
                Some(Transition::WentOffline) => {
                    tracing::info!(pending = status.pending, "backend unreachable, working offline");
                }
                None => {}
            }
            if report.success > 0 {
                tracing::info!("auto-synced {} operations", report.success);
            }
            if report.failed > 0 {
                tracing::warn!(failed = report.failed, "operations left queued after sync");
            }

            status_tx.send_replace(status);
        }

        tracing::info!("connectivity monitor stopped");
    });

    MonitorHandle {
        status: status_rx,
        shutdown: shutdown_tx,
        task,
    }
}
