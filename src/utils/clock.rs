use chrono::Utc;

/// Current wall-clock time as Unix epoch seconds.
///
/// Fractional seconds are kept: the snapshot stores float timestamps and
/// the rate windows are sub-second sensitive. Core operations take `now`
/// as a parameter so tests can drive the clock; this is the one place
/// production code reads it.
pub fn now() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6
}
