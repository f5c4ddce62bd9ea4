//! Outcome of one replay pass.

/// Counts from one `process_queue` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Operations replayed and removed from the queue.
    pub success: usize,
    /// Operations attempted and left queued for the next pass.
    pub failed: usize,
}

impl SyncReport {
    /// A pass that attempted nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of operations attempted.
    pub fn attempted(&self) -> usize {
        self.success + self.failed
    }

    /// True when nothing was attempted.
    pub fn is_empty(&self) -> bool {
        self.attempted() == 0
    }

    /// Count one successful replay.
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    /// Count one failed replay.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_attempted_nothing() {
        let report = SyncReport::empty();
        assert!(report.is_empty());
        assert_eq!(report, SyncReport { success: 0, failed: 0 });
    }

    #[test]
    fn records_accumulate() {
        let mut report = SyncReport::empty();
        report.record_success();
        report.record_failure();
        report.record_success();

        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.attempted(), 3);
        assert!(!report.is_empty());
    }
}
