use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([dhm])$").expect("duration pattern is valid"));

/// Parse a `1d` / `2h` / `30m` duration argument. Zero or malformed input
/// yields `None` and callers fall back to their own defaults.
pub fn parse_duration(arg: &str) -> Option<Duration> {
    let caps = DURATION_RE.captures(arg)?;
    let value: u64 = caps[1].parse().ok()?;
    if value == 0 {
        return None;
    }
    let unit_secs = match &caps[2] {
        "d" => 86_400,
        "h" => 3_600,
        "m" => 60,
        _ => return None,
    };
    Some(Duration::from_secs(value * unit_secs))
}

/// Human form of a duration: `1d 2h 30m`. Anything under a minute reads
/// as `1m`, matching how mute terms are announced.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }

    if parts.is_empty() {
        "1m".to_string()
    } else {
        parts.join(" ")
    }
}

/// `DD.MM.YYYY HH:MM` rendering of an epoch-seconds expiry timestamp.
pub fn format_timestamp(epoch_secs: f64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_secs as i64, 0) {
        Some(dt) => dt.format("%d.%m.%Y %H:%M").to_string(),
        None => "unknown".to_string(),
    }
}

/// Inline mention link for a user who may not be resolvable by the bot.
pub fn mention(user_id: u64, label: &str) -> String {
    format!(
        r#"<a href="tg://user?id={user_id}">{}</a>"#,
        html_escape::encode_text(label)
    )
}

/// Escape user-provided text for HTML-mode replies.
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7_200)));
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1_800)));
    }

    #[test]
    fn rejects_junk_and_zero() {
        assert_eq!(parse_duration("forever"), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("h1"), None);
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn formats_compound_durations() {
        assert_eq!(format_duration(Duration::from_secs(86_400 + 7_200)), "1d 2h");
        assert_eq!(format_duration(Duration::from_secs(1_800)), "30m");
        assert_eq!(
            format_duration(Duration::from_secs(90_000 + 60)),
            "1d 1h 1m"
        );
    }

    #[test]
    fn sub_minute_reads_as_one_minute() {
        assert_eq!(format_duration(Duration::from_secs(5)), "1m");
        assert_eq!(format_duration(Duration::ZERO), "1m");
    }

    #[test]
    fn mention_escapes_label() {
        let m = mention(7, "<evil>");
        assert!(m.contains("tg://user?id=7"));
        assert!(m.contains("&lt;evil&gt;"));
    }
}
