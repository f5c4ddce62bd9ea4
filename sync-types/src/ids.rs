//! Identity types for queued operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Identifier of a queued operation.
///
/// Formatted as `<unix millis>_<9 base36 chars>`, so ids sort roughly by
/// enqueue time and stay readable in logs. Ids loaded from storage are kept
/// verbatim even if they do not follow this format.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Generate a fresh id stamped with the current time.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generate a fresh id stamped with `at`.
    pub fn generate_at(at: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; SUFFIX_LEN];
        if getrandom::getrandom(&mut bytes).is_err() {
            // Entropy source unavailable: spread sub-millisecond clock bits instead.
            let nanos = Utc::now().timestamp_subsec_nanos().to_le_bytes();
            for (i, byte) in bytes.iter_mut().enumerate() {
                *byte = nanos[i % nanos.len()].wrapping_mul(31).wrapping_add(i as u8);
            }
        }
        let suffix: String = bytes
            .iter()
            .map(|b| BASE36[usize::from(*b) % BASE36.len()] as char)
            .collect();
        Self(format!("{}_{}", at.timestamp_millis(), suffix))
    }

    /// Wrap an existing id string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationId({})", self.0)
    }
}

impl From<&str> for OperationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
