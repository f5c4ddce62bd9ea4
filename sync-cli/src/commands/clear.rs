//! Drop operations from the queue.

use anyhow::Result;
use cleanout_sync_client::{BackendGateway, SyncService};

/// Run the clear command. Returns how many operations were dropped.
pub async fn run<G: BackendGateway>(service: &SyncService<G>, all: bool) -> Result<usize> {
    let removed = if all {
        service.clear_all().await
    } else {
        service.clear_synced().await
    };

    if all {
        println!("Discarded {} operations", removed);
    } else {
        println!("Removed {} synced operations", removed);
    }
    println!("Pending: {}", service.pending_count().await);

    Ok(removed)
}
