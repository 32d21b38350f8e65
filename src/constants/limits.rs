use std::time::Duration;

/// Warns before an automatic mute fires.
pub const WARN_THRESHOLD: u32 = 3;

/// Duration of the automatic mute issued at the warn threshold.
pub const AUTO_MUTE_DURATION: Duration = Duration::from_secs(3 * 60 * 60);

/// Reason recorded on escalation mutes.
pub const AUTO_MUTE_REASON: &str = "warn threshold exceeded";

/// Issuer label for escalation mutes.
pub const WARN_SYSTEM_NAME: &str = "warn-system";

/// Issuer label for anti-spam punishments.
pub const ANTISPAM_SYSTEM_NAME: &str = "antispam-system";

/// Flood control: admitted requests per sliding window.
pub const DEFAULT_FLOOD_LIMIT: usize = 3;

/// Flood control: sliding window length in seconds.
pub const DEFAULT_FLOOD_WINDOW_SECS: f64 = 3.0;

/// Anti-spam defaults. Content-triggered and distinct from flood control:
/// exceeding this window punishes instead of deferring.
pub const DEFAULT_SPAM_WINDOW_SECS: f64 = 10.0;
pub const DEFAULT_SPAM_MAX_MESSAGES: usize = 5;
pub const DEFAULT_SPAM_MUTE_MINUTES: u64 = 30;

/// Mute applied when the command carries no duration argument.
pub const DEFAULT_MUTE_DURATION: Duration = Duration::from_secs(60 * 60);

/// How often the reconciliation sweep lifts expired punishments.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How often idle per-user windows are evicted.
pub const WINDOW_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Messages at most this long are never treated as shouting.
pub const CAPS_MIN_LEN: usize = 10;

/// Fraction of uppercase characters that counts as shouting.
pub const CAPS_RATIO: f64 = 0.7;

/// Telegram hard limit is 4096; leave headroom for formatting tags.
pub const MESSAGE_CHUNK_LIMIT: usize = 3500;
