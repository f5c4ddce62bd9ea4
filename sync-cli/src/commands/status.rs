//! Show queue status.

use anyhow::Result;
use cleanout_sync_client::types::SyncOperation;
use cleanout_sync_client::{BackendGateway, SyncService};

/// Run the status command.
pub async fn run<G: BackendGateway>(service: &SyncService<G>, verbose: bool) -> Result<()> {
    let pending = service.pending_operations().await;

    println!("Pending: {}", pending.len());
    if verbose {
        for op in &pending {
            println!("  {}", describe(op));
        }
    }

    Ok(())
}

/// One-line summary of a queued operation.
fn describe(op: &SyncOperation) -> String {
    let target = if op.entity_id().is_empty() {
        "-"
    } else {
        op.entity_id()
    };
    format!(
        "{}  {} {} {}  queued {}",
        op.id(),
        op.operation_type(),
        op.entity_type(),
        target,
        op.created_at().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
