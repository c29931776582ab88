//! Debouncing logic for head-reference change events.
//!
//! A commit arrives as a burst of filesystem events (lock-file creation,
//! ref-file write, lock-file removal). The debouncer filters the burst down
//! to events naming the tracked reference file and collapses it into a
//! single [`CommitEvent`] once the burst has settled. Write-then-rename
//! commit protocols are not atomic, so the head value must not be read
//! before the settle delay elapses.

use std::time::{Duration, Instant};

/// A logical "the repository's head moved" notification.
///
/// Carries no payload; downstream re-reads the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitEvent;

/// Collapses bursts of ref-file events into single commit events.
///
/// The settle delay is measured from the first matching event of a burst.
/// Later events in the same burst do not extend the deadline, so a commit
/// is surfaced at most `settle` after its first visible write.
#[derive(Debug)]
pub struct CommitDebouncer {
    /// File name of the tracked head reference (e.g. `main` or `HEAD`).
    ref_name: String,
    /// When the first matching event of the current burst arrived.
    armed_at: Option<Instant>,
    /// How long a burst must settle before one commit event is emitted.
    settle: Duration,
}

impl CommitDebouncer {
    /// Create a new debouncer tracking `ref_name` with the given settle
    /// delay in milliseconds.
    pub fn new(ref_name: impl Into<String>, settle_ms: u64) -> Self {
        Self {
            ref_name: ref_name.into(),
            armed_at: None,
            settle: Duration::from_millis(settle_ms),
        }
    }

    /// Whether a changed file name belongs to the tracked reference.
    ///
    /// Matches the ref itself, its lock-file variant, and the repository's
    /// `HEAD` file (with lock variant). Everything else is commit-unrelated
    /// churn and is discarded by the caller.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name == self.ref_name
            || file_name == format!("{}.lock", self.ref_name)
            || file_name == "HEAD"
            || file_name == "HEAD.lock"
    }

    /// Record one matching event.
    ///
    /// Arms the settle timer if no burst is in progress. Events landing in
    /// an already-armed burst are absorbed without resetting the timer.
    pub fn record(&mut self) {
        if self.armed_at.is_none() {
            self.armed_at = Some(Instant::now());
        }
    }

    /// Take the commit event if the current burst has settled.
    ///
    /// Returns `Some` exactly once per burst; afterwards the debouncer is
    /// disarmed and ready for the next burst.
    pub fn take_ready(&mut self) -> Option<CommitEvent> {
        match self.armed_at {
            Some(armed) if armed.elapsed() >= self.settle => {
                self.armed_at = None;
                Some(CommitEvent)
            }
            _ => None,
        }
    }

    /// Check if a burst is currently waiting to settle.
    pub fn has_pending(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Name of the tracked reference file.
    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_debouncer_basic() {
        let mut debouncer = CommitDebouncer::new("main", 50);

        debouncer.record();

        // Immediately after, nothing should be ready
        assert!(debouncer.take_ready().is_none());
        assert!(debouncer.has_pending());

        // Wait for the settle period
        sleep(Duration::from_millis(60));

        // Now it should be ready, exactly once
        assert_eq!(debouncer.take_ready(), Some(CommitEvent));
        assert!(!debouncer.has_pending());
        assert!(debouncer.take_ready().is_none());
    }

    #[test]
    fn test_burst_does_not_extend_deadline() {
        let mut debouncer = CommitDebouncer::new("main", 50);

        debouncer.record();
        sleep(Duration::from_millis(30));

        // A second event in the same burst must not reset the timer
        debouncer.record();
        sleep(Duration::from_millis(30));

        // 60ms after the FIRST event, the burst has settled
        assert_eq!(debouncer.take_ready(), Some(CommitEvent));
    }

    #[test]
    fn test_burst_collapses_to_one_event() {
        let mut debouncer = CommitDebouncer::new("main", 50);

        // Lock created, ref written, lock removed
        debouncer.record();
        debouncer.record();
        debouncer.record();

        sleep(Duration::from_millis(60));

        assert_eq!(debouncer.take_ready(), Some(CommitEvent));
        // The burst produced exactly one event
        assert!(debouncer.take_ready().is_none());
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_new_burst_after_settle() {
        let mut debouncer = CommitDebouncer::new("main", 50);

        debouncer.record();
        sleep(Duration::from_millis(60));
        assert!(debouncer.take_ready().is_some());

        // A fresh event arms a new burst
        debouncer.record();
        assert!(debouncer.has_pending());
        assert!(debouncer.take_ready().is_none());
        sleep(Duration::from_millis(60));
        assert!(debouncer.take_ready().is_some());
    }

    #[test]
    fn test_matches_tracked_ref_only() {
        let debouncer = CommitDebouncer::new("main", 50);

        assert!(debouncer.matches("main"));
        assert!(debouncer.matches("main.lock"));
        assert!(debouncer.matches("HEAD"));
        assert!(debouncer.matches("HEAD.lock"));

        assert!(!debouncer.matches("develop"));
        assert!(!debouncer.matches("develop.lock"));
        assert!(!debouncer.matches("ORIG_HEAD"));
        assert!(!debouncer.matches("index.lock"));
        assert!(!debouncer.matches("packed-refs"));
    }

    #[test]
    fn test_detached_head_tracking() {
        let debouncer = CommitDebouncer::new("HEAD", 50);

        assert!(debouncer.matches("HEAD"));
        assert!(debouncer.matches("HEAD.lock"));
        assert!(!debouncer.matches("config"));
    }
}
