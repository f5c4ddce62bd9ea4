//! CLI command implementations.

pub mod clear;
pub mod enqueue;
pub mod login;
pub mod status;
pub mod sync;
pub mod watch;
