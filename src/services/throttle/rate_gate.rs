use std::collections::VecDeque;

use dashmap::DashMap;

/// Admission decision for one inbound command or message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Admitted,
    /// Too many requests in the window; retry after this many seconds.
    Rejected { retry_after: f64 },
}

/// Per-user sliding-window flood control.
///
/// Gates processing only: a rejected request is dropped without being
/// recorded in the window. Content-triggered punishment is the anti-spam
/// tracker's job, not this one's.
pub struct RateGate {
    /// user_id -> timestamps of recently admitted requests
    windows: DashMap<u64, VecDeque<f64>>,
    limit: usize,
    window_secs: f64,
}

impl RateGate {
    pub fn new(limit: usize, window_secs: f64) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window_secs,
        }
    }

    /// Check one request at `now` (epoch seconds). The window is pruned on
    /// every check, so it slides continuously.
    pub fn admit(&self, user_id: u64, now: f64) -> Admission {
        let mut window = self.windows.entry(user_id).or_default();

        while let Some(&oldest) = window.front() {
            if now - oldest >= self.window_secs {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.limit {
            let oldest = window.front().copied().unwrap_or(now);
            return Admission::Rejected {
                retry_after: self.window_secs - (now - oldest),
            };
        }

        window.push_back(now);
        Admission::Admitted
    }

    /// Evict windows whose newest entry has aged out, so the map stays
    /// bounded in a long-running process. Driven from a maintenance tick.
    pub fn prune_idle(&self, now: f64) {
        self.windows
            .retain(|_, window| window.back().is_some_and(|&t| now - t < self.window_secs));
    }

    /// Tracked users (for maintenance logging).
    pub fn tracked_users(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_admits_after_oldest_ages_out() {
        // 3 admissions at t=0,1,2; a 4th at t=2.5 is rejected; a 5th at
        // t=3.1 is admitted because the t=0 entry has aged out.
        let gate = RateGate::new(3, 3.0);

        assert_eq!(gate.admit(1, 0.0), Admission::Admitted);
        assert_eq!(gate.admit(1, 1.0), Admission::Admitted);
        assert_eq!(gate.admit(1, 2.0), Admission::Admitted);

        match gate.admit(1, 2.5) {
            Admission::Rejected { retry_after } => {
                assert!((retry_after - 0.5).abs() < 1e-9);
            }
            Admission::Admitted => panic!("4th request inside the window must be rejected"),
        }

        assert_eq!(gate.admit(1, 3.1), Admission::Admitted);
    }

    #[test]
    fn rejected_attempts_are_not_recorded() {
        let gate = RateGate::new(1, 10.0);
        assert_eq!(gate.admit(1, 0.0), Admission::Admitted);
        // Hammering while rejected must not extend the lockout.
        for i in 1..5 {
            assert!(matches!(
                gate.admit(1, f64::from(i)),
                Admission::Rejected { .. }
            ));
        }
        assert_eq!(gate.admit(1, 10.0), Admission::Admitted);
    }

    #[test]
    fn users_are_independent() {
        let gate = RateGate::new(1, 5.0);
        assert_eq!(gate.admit(1, 0.0), Admission::Admitted);
        assert_eq!(gate.admit(2, 0.0), Admission::Admitted);
    }

    #[test]
    fn prune_idle_drops_stale_windows() {
        let gate = RateGate::new(3, 3.0);
        gate.admit(1, 0.0);
        gate.admit(2, 100.0);
        gate.prune_idle(100.5);
        assert_eq!(gate.tracked_users(), 1);
    }
}
