//! Best-effort host metrics for the stats command; anything unreadable
//! reports as zero rather than failing the command.

pub async fn cpu_temperature() -> f64 {
    match tokio::fs::read_to_string("/sys/class/thermal/thermal_zone0/temp").await {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(|millidegrees| millidegrees / 1000.0)
            .unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

pub async fn ram_usage_percent() -> f64 {
    match tokio::fs::read_to_string("/proc/meminfo").await {
        Ok(raw) => parse_meminfo(&raw).unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

fn parse_meminfo(raw: &str) -> Option<f64> {
    let mut total = None;
    let mut available = None;
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = rest.split_whitespace().next()?.parse::<f64>().ok();
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = rest.split_whitespace().next()?.parse::<f64>().ok();
        }
    }
    let (total, available) = (total?, available?);
    if total <= 0.0 {
        return None;
    }
    Some(((total - available) / total * 10_000.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meminfo_percentage() {
        let raw = "MemTotal:       16000000 kB\n\
                   MemFree:         2000000 kB\n\
                   MemAvailable:    8000000 kB\n";
        assert_eq!(parse_meminfo(raw), Some(50.0));
    }

    #[test]
    fn truncated_meminfo_is_none() {
        assert_eq!(parse_meminfo("MemTotal: 16000000 kB\n"), None);
        assert_eq!(parse_meminfo(""), None);
    }
}
