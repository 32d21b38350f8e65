use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::bot::error::Error;

const TEMP_SUFFIX: &str = ".tmp";

/// Persisted usage counters. The roster of seen users doubles as the
/// mention list for the all-ping command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub unique_users: Vec<u64>,
    pub coin_requests: u64,
    pub daily_activity: u64,
}

impl UsageSnapshot {
    pub fn total_users(&self) -> usize {
        self.unique_users.len()
    }
}

/// Usage statistics with the same atomic-replace persistence as the
/// punishment snapshot. Stats are best-effort: a failed write is logged
/// and never blocks command handling.
pub struct UsageStats {
    path: PathBuf,
    inner: Mutex<UsageSnapshot>,
}

impl UsageStats {
    /// Load existing stats, or start fresh when the file is missing or
    /// unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Stats file is malformed ({}), starting fresh", e);
                UsageSnapshot::default()
            }),
            Err(_) => UsageSnapshot::default(),
        };
        Self {
            path,
            inner: Mutex::new(snapshot),
        }
    }

    /// Record one handled command; `is_coin` also bumps the price counter.
    pub async fn record_command(&self, user_id: u64, is_coin: bool) {
        let mut stats = self.inner.lock().await;
        if !stats.unique_users.contains(&user_id) {
            stats.unique_users.push(user_id);
        }
        if is_coin {
            stats.coin_requests += 1;
        }
        stats.daily_activity += 1;
        self.persist(&stats).await;
    }

    /// Midnight reset of the daily activity counter.
    pub async fn reset_daily(&self) {
        let mut stats = self.inner.lock().await;
        stats.daily_activity = 0;
        self.persist(&stats).await;
    }

    pub async fn snapshot(&self) -> UsageSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn known_users(&self) -> Vec<u64> {
        self.inner.lock().await.unique_users.clone()
    }

    async fn persist(&self, stats: &UsageSnapshot) {
        if let Err(e) = self.write_atomic(stats).await {
            warn!("Failed to persist usage stats: {}", e);
        }
    }

    async fn write_atomic(&self, stats: &UsageSnapshot) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(stats)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(TEMP_SUFFIX);
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(Error::Persistence)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(Error::Persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn users_are_counted_once() {
        let dir = tempfile::tempdir().unwrap();
        let stats = UsageStats::open(dir.path().join("stats.json")).await;

        stats.record_command(1, false).await;
        stats.record_command(1, true).await;
        stats.record_command(2, false).await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.total_users(), 2);
        assert_eq!(snapshot.coin_requests, 1);
        assert_eq!(snapshot.daily_activity, 3);
    }

    #[tokio::test]
    async fn daily_reset_keeps_the_roster() {
        let dir = tempfile::tempdir().unwrap();
        let stats = UsageStats::open(dir.path().join("stats.json")).await;

        stats.record_command(1, false).await;
        stats.reset_daily().await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.daily_activity, 0);
        assert_eq!(snapshot.total_users(), 1);
    }

    #[tokio::test]
    async fn stats_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        {
            let stats = UsageStats::open(&path).await;
            stats.record_command(7, true).await;
        }

        let reopened = UsageStats::open(&path).await;
        let snapshot = reopened.snapshot().await;
        assert_eq!(snapshot.unique_users, vec![7]);
        assert_eq!(snapshot.coin_requests, 1);
    }
}
