use std::collections::VecDeque;

use dashmap::DashMap;

/// Content-triggered spam window, separate from the command rate gate:
/// exceeding this one punishes (delete + warn + timed mute) instead of
/// deferring processing.
pub struct SpamTracker {
    /// user_id -> timestamps of recent messages
    windows: DashMap<u64, VecDeque<f64>>,
    window_secs: f64,
    max_messages: usize,
}

impl SpamTracker {
    pub fn new(window_secs: f64, max_messages: usize) -> Self {
        Self {
            windows: DashMap::new(),
            window_secs,
            max_messages,
        }
    }

    /// Record one message at `now`; returns true when the user just
    /// exceeded the tolerated count inside the window.
    pub fn record(&self, user_id: u64, now: f64) -> bool {
        let mut window = self.windows.entry(user_id).or_default();

        while let Some(&oldest) = window.front() {
            if now - oldest >= self.window_secs {
                window.pop_front();
            } else {
                break;
            }
        }

        window.push_back(now);
        window.len() > self.max_messages
    }

    /// Forget a user's window. Called after the punishment is applied so a
    /// single burst does not trigger twice.
    pub fn reset(&self, user_id: u64) {
        self.windows.remove(&user_id);
    }

    /// Evict windows whose newest entry has aged out.
    pub fn prune_idle(&self, now: f64) {
        self.windows
            .retain(|_, window| window.back().is_some_and(|&t| now - t < self.window_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_only_past_the_cap() {
        let tracker = SpamTracker::new(10.0, 3);
        assert!(!tracker.record(1, 0.0));
        assert!(!tracker.record(1, 1.0));
        assert!(!tracker.record(1, 2.0));
        assert!(tracker.record(1, 3.0));
    }

    #[test]
    fn slow_senders_never_trigger() {
        let tracker = SpamTracker::new(10.0, 3);
        for i in 0..20 {
            assert!(!tracker.record(1, f64::from(i) * 11.0));
        }
    }

    #[test]
    fn reset_clears_the_burst() {
        let tracker = SpamTracker::new(10.0, 2);
        tracker.record(1, 0.0);
        tracker.record(1, 0.1);
        assert!(tracker.record(1, 0.2));
        tracker.reset(1);
        assert!(!tracker.record(1, 0.3));
    }
}
