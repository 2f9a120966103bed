//! Human-readable bit-rate formatting.

use std::time::Duration;

const UNITS: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];
const FACTOR: f64 = 1000.0;

/// Formats `bytes` transferred over `duration` as a bits-per-second string.
///
/// The duration is truncated to whole seconds; a zero-second duration yields
/// `"0.00 bps"`. Scaling uses SI prefixes with a factor of exactly 1000, per
/// bit-rate convention.
pub fn format_bps(bytes: u64, duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return "0.00 bps".into();
    }

    let mut speed = (bytes as u128 * 8) as f64 / secs as f64;

    if speed < FACTOR {
        return format!("{speed:.2} bps");
    }

    let mut unit = 0;
    speed /= FACTOR;
    while speed >= FACTOR && unit + 1 < UNITS.len() {
        speed /= FACTOR;
        unit += 1;
    }
    format!("{speed:.2} {}bps", UNITS[unit])
}
