//! Run the connectivity monitor in the foreground.

use anyhow::{Context, Result};
use cleanout_sync_client::{spawn_connectivity_monitor, BackendGateway, SyncService};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Run the watch command until Ctrl-C.
pub async fn run<G: BackendGateway + 'static>(
    service: Arc<SyncService<G>>,
    every: Duration,
) -> Result<()> {
    println!(
        "Watching backend every {}s (Ctrl-C to stop)",
        every.as_secs()
    );
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
        }
    };
    watch_until(service, every, ctrl_c).await
}

/// Print every status change until `stop` resolves.
async fn watch_until<G, F>(service: Arc<SyncService<G>>, every: Duration, stop: F) -> Result<()>
where
    G: BackendGateway + 'static,
    F: Future<Output = ()>,
{
    let handle = spawn_connectivity_monitor(service, every);
    let mut status = handle.subscribe();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            changed = status.changed() => {
                changed.context("Connectivity monitor stopped unexpectedly")?;
                let current = *status.borrow_and_update();
                let state = if current.online { "online" } else { "offline" };
                println!("{}  pending: {}", state, current.pending);
            }
        }
    }

    handle.shutdown().await;
    println!("Stopped.");
    Ok(())
}
