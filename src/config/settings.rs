use std::env;

use crate::bot::error::Error;
use crate::constants::limits::{
    DEFAULT_FLOOD_LIMIT, DEFAULT_FLOOD_WINDOW_SECS, DEFAULT_SPAM_MAX_MESSAGES,
    DEFAULT_SPAM_MUTE_MINUTES, DEFAULT_SPAM_WINDOW_SECS,
};

/// Default trading pair watched by the `/coin` command.
const DEFAULT_PAIR_ADDRESS: &str = "eqayrrajgsuyhrggo1himnbgv9tvlndz3uoclaoytw_fgegd";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    /// The chat this bot serves. Commands from other chats are ignored;
    /// missing configuration degrades to allow (and logs loudly).
    pub chat_id: Option<i64>,
    /// Path of the persisted punishment snapshot.
    pub data_file: String,
    /// Path of the persisted usage statistics.
    pub stats_file: String,
    /// Users allowed to read bot statistics, independent of chat admin status.
    pub admin_ids: Vec<u64>,
    /// Flood control: admitted requests per window.
    pub flood_limit: usize,
    /// Flood control: sliding window in seconds.
    pub flood_window_secs: f64,
    /// Anti-spam: rolling window in seconds.
    pub spam_window_secs: f64,
    /// Anti-spam: messages tolerated inside the window.
    pub spam_max_messages: usize,
    /// Anti-spam: minutes of the direct mute applied on trigger.
    pub spam_mute_minutes: u64,
    /// Toggle for the caps filter.
    pub anticaps: bool,
    /// Toggle for the anti-spam filter.
    pub antispam: bool,
    /// DexScreener pair address for price lookups.
    pub pair_address: String,
}

impl Settings {
    /// Load settings from the environment. `token_var` names the env var
    /// holding this binary's bot token; everything else is shared between
    /// the two bots.
    pub fn from_env(token_var: &'static str) -> Result<Self, Error> {
        let bot_token = env::var(token_var).map_err(|_| Error::ConfigurationMissing(token_var))?;

        let chat_id = env::var("CHAT_ID").ok().and_then(|s| s.parse::<i64>().ok());

        let data_file =
            env::var("DATA_FILE").unwrap_or_else(|_| "punishments.json".to_string());
        let stats_file = env::var("STATS_FILE").unwrap_or_else(|_| "stats.json".to_string());

        let admin_ids = env::var("ADMIN_IDS")
            .ok()
            .map(|s| {
                s.split(',')
                    .filter_map(|part| part.trim().parse::<u64>().ok())
                    .collect()
            })
            .unwrap_or_default();

        let flood_limit = env::var("FLOOD_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FLOOD_LIMIT);

        let flood_window_secs = env::var("FLOOD_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FLOOD_WINDOW_SECS);

        let spam_window_secs = env::var("SPAM_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SPAM_WINDOW_SECS);

        let spam_max_messages = env::var("SPAM_MAX_MESSAGES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SPAM_MAX_MESSAGES);

        let spam_mute_minutes = env::var("SPAM_MUTE_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SPAM_MUTE_MINUTES);

        let anticaps = env::var("ANTICAPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        let antispam = env::var("ANTISPAM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        let pair_address =
            env::var("PAIR_ADDRESS").unwrap_or_else(|_| DEFAULT_PAIR_ADDRESS.to_string());

        Ok(Self {
            bot_token,
            chat_id,
            data_file,
            stats_file,
            admin_ids,
            flood_limit,
            flood_window_secs,
            spam_window_secs,
            spam_max_messages,
            spam_mute_minutes,
            anticaps,
            antispam,
            pair_address,
        })
    }
}
