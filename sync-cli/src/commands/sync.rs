//! Replay the queue once.

use anyhow::Result;
use cleanout_sync_client::{BackendGateway, ConnectivityStatus, SyncReport, SyncService};

/// Run the sync command.
pub async fn run<G: BackendGateway>(
    service: &SyncService<G>,
) -> Result<(ConnectivityStatus, SyncReport)> {
    let (status, report) = service.refresh().await;

    if status.online {
        println!("Synced: {}", report.success);
        println!("Failed: {}", report.failed);
    } else {
        println!("Backend unreachable, nothing replayed");
    }
    println!("Pending: {}", status.pending);

    Ok((status, report))
}
