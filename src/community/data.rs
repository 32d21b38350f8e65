use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::config::Settings;
use crate::services::stats::usage::UsageStats;
use crate::services::throttle::rate_gate::RateGate;

/// Price API requests must not hang the handler indefinitely.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state of the community bot.
pub struct HeraldData {
    pub settings: Settings,
    pub stats: UsageStats,
    pub flood_gate: RateGate,
    pub http: reqwest::Client,
    pub started_at: DateTime<Utc>,
}

impl HeraldData {
    pub fn new(settings: Settings, stats: UsageStats) -> Self {
        let flood_gate = RateGate::new(settings.flood_limit, settings.flood_window_secs);
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            settings,
            stats,
            flood_gate,
            http,
            started_at: Utc::now(),
        }
    }

    /// Scope check against the configured chat. A missing CHAT_ID degrades
    /// to allow, logged at error level on every occurrence.
    pub fn in_scope(&self, chat_id: i64) -> bool {
        match self.settings.chat_id {
            Some(configured) => configured == chat_id,
            None => {
                error!("CHAT_ID is not configured; treating chat {} as allowed", chat_id);
                true
            }
        }
    }

    /// Static admin list from configuration (for the stats command).
    pub fn is_configured_admin(&self, user_id: u64) -> bool {
        self.settings.admin_ids.contains(&user_id)
    }
}
