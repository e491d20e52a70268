//! Push/poll synchronisation planning.
//!
//! Pushed events are the primary transport; when the push channel breaks the
//! client degrades to fixed-interval polling and returns to push once the
//! channel is restored. The planner only decides *when* a refetch is due,
//! the caller owns the actual requests.

use std::time::{Duration, Instant};

/// Fixed polling cadence used while the push channel is down.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Transport the client currently relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Pushed events are flowing; no polling.
    Push,
    /// Push channel is broken; refetch on a fixed interval.
    Polling,
}

/// Decides when the next snapshot refetch is due.
#[derive(Debug)]
pub struct SyncPlanner {
    mode: SyncMode,
    next_poll: Option<Instant>,
}

impl SyncPlanner {
    /// Start in push mode.
    pub fn new() -> Self {
        Self {
            mode: SyncMode::Push,
            next_poll: None,
        }
    }

    /// Current transport.
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// The push channel broke: switch to polling with an immediate first
    /// refetch, since the last pushed snapshot may already be stale.
    pub fn on_push_failure(&mut self, now: Instant) {
        if self.mode == SyncMode::Push {
            self.mode = SyncMode::Polling;
            self.next_poll = Some(now);
        }
    }

    /// The push channel is flowing again: stop polling.
    pub fn on_push_restored(&mut self) {
        self.mode = SyncMode::Push;
        self.next_poll = None;
    }

    /// Whether a poll is due now. Never true in push mode.
    pub fn poll_due(&self, now: Instant) -> bool {
        matches!(self.next_poll, Some(deadline) if now >= deadline)
    }

    /// Record a completed poll and schedule the next one.
    pub fn poll_completed(&mut self, now: Instant) {
        if self.mode == SyncMode::Polling {
            self.next_poll = Some(now + POLL_INTERVAL);
        }
    }
}

impl Default for SyncPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_mode_never_polls() {
        let planner = SyncPlanner::new();
        assert_eq!(planner.mode(), SyncMode::Push);
        assert!(!planner.poll_due(Instant::now()));
    }

    #[test]
    fn push_failure_triggers_an_immediate_poll() {
        let mut planner = SyncPlanner::new();
        let now = Instant::now();

        planner.on_push_failure(now);
        assert_eq!(planner.mode(), SyncMode::Polling);
        assert!(planner.poll_due(now));

        planner.poll_completed(now);
        assert!(!planner.poll_due(now));
        assert!(planner.poll_due(now + POLL_INTERVAL));
    }

    #[test]
    fn restored_push_stops_polling() {
        let mut planner = SyncPlanner::new();
        let now = Instant::now();
        planner.on_push_failure(now);
        planner.poll_completed(now);

        planner.on_push_restored();
        assert_eq!(planner.mode(), SyncMode::Push);
        assert!(!planner.poll_due(now + POLL_INTERVAL));

        // A second failure polls immediately again.
        planner.on_push_failure(now);
        assert!(planner.poll_due(now));
    }

    #[test]
    fn repeated_failures_do_not_reset_the_schedule() {
        let mut planner = SyncPlanner::new();
        let now = Instant::now();
        planner.on_push_failure(now);
        planner.poll_completed(now);

        planner.on_push_failure(now);
        assert!(!planner.poll_due(now));
    }
}
