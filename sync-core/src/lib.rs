//! # sync-core
//!
//! Pure logic for the Cleanout offline sync service (no I/O, instant tests).
//!
//! This crate implements the queue bookkeeping and connectivity tracking
//! without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about queue transitions
//!
//! The actual I/O (backend calls, storage) is performed by `sync-client`,
//! which drives these types from its `SyncService`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod queue;
pub mod report;

pub use connectivity::{ConnectivityState, Transition};
pub use queue::{OperationQueue, QueueError};
pub use report::SyncReport;
