//! Connectivity tracking for the offline sync service.
//!
//! A pure tracker fed with health probe results. It remembers whether the
//! backend was last seen online and reports transitions, so the monitor in
//! sync-client can log "back online" once instead of on every tick.

/// What the last health probes said about the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    /// No probe has completed yet.
    #[default]
    Unknown,
    /// The last probe succeeded.
    Online,
    /// The last probes failed.
    Offline {
        /// Consecutive failed probes.
        failed_checks: u32,
    },
}

/// A change worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Backend became reachable (from unknown or offline).
    CameOnline,
    /// Backend became unreachable (from unknown or online).
    WentOffline,
}

impl ConnectivityState {
    /// Create a tracker with no observations.
    pub fn new() -> Self {
        Self::Unknown
    }

    /// Feed one probe result. Returns the new state and the transition, if any.
    ///
    /// This is a pure function; the caller owns logging and side effects.
    pub fn observe(self, healthy: bool) -> (Self, Option<Transition>) {
        match (self, healthy) {
            (Self::Online, true) => (Self::Online, None),
            (_, true) => (Self::Online, Some(Transition::CameOnline)),
            (Self::Offline { failed_checks }, false) => (
                Self::Offline {
                    failed_checks: failed_checks.saturating_add(1),
                },
                None,
            ),
            (_, false) => (
                Self::Offline { failed_checks: 1 },
                Some(Transition::WentOffline),
            ),
        }
    }

    /// True if the last probe succeeded.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}
