//! Human-readable rates and sizes.
//!
//! Uses the same units as `tc -s`: decimal bit rates, packet rates with a
//! `pps` suffix, and byte counts in binary units.
//!
//! # Example
//!
//! ```
//! use qstats::util::rate;
//!
//! assert_eq!(rate::format_bits(1_500_000), "1.5Mbit");
//! assert_eq!(rate::format_pps(12), "12pps");
//! assert_eq!(rate::format_size(1514), "1514b");
//! ```

/// Convert bytes per second to bits per second.
#[inline]
pub const fn bytes_to_bits(bps: u64) -> u64 {
    bps.saturating_mul(8)
}

/// Format a bit rate.
///
/// ```
/// use qstats::util::rate::format_bits;
///
/// assert_eq!(format_bits(0), "0bit");
/// assert_eq!(format_bits(999), "999bit");
/// assert_eq!(format_bits(1_000), "1Kbit");
/// assert_eq!(format_bits(10_000_000_000), "10Gbit");
/// ```
pub fn format_bits(bits_per_sec: u64) -> String {
    scaled(bits_per_sec, 1000.0, &["bit", "Kbit", "Mbit", "Gbit", "Tbit"])
}

/// Format a byte rate as bits, the way the estimator counters are shown.
pub fn format_byte_rate(bytes_per_sec: u64) -> String {
    format_bits(bytes_to_bits(bytes_per_sec))
}

/// Format a packet rate.
///
/// ```
/// use qstats::util::rate::format_pps;
///
/// assert_eq!(format_pps(5), "5pps");
/// assert_eq!(format_pps(2_500), "2.5Kpps");
/// ```
pub fn format_pps(pps: u64) -> String {
    scaled(pps, 1000.0, &["pps", "Kpps", "Mpps", "Gpps"])
}

/// Format a backlog size in bytes.
///
/// ```
/// use qstats::util::rate::format_size;
///
/// assert_eq!(format_size(0), "0b");
/// assert_eq!(format_size(2048), "2Kb");
/// assert_eq!(format_size(3 * 1024 * 1024 / 2), "1536Kb");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    // Only switch units on exact multiples, as tc does for backlog.
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}Mb", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}Kb", bytes / KIB)
    } else {
        format!("{}b", bytes)
    }
}

fn scaled(value: u64, step: f64, units: &[&str]) -> String {
    let mut v = value as f64;
    let mut unit = 0;
    while v >= step && unit + 1 < units.len() {
        v /= step;
        unit += 1;
    }

    if unit == 0 {
        format!("{}{}", value, units[0])
    } else if v.fract() == 0.0 {
        format!("{}{}", v as u64, units[unit])
    } else {
        format!("{:.1}{}", v, units[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bits() {
        assert_eq!(format_bits(0), "0bit");
        assert_eq!(format_bits(8_000), "8Kbit");
        assert_eq!(format_bits(1_500_000), "1.5Mbit");
        assert_eq!(format_bits(100_000_000), "100Mbit");
        assert_eq!(format_bits(2_000_000_000_000_000), "2000Tbit");
    }

    #[test]
    fn test_format_byte_rate() {
        assert_eq!(format_byte_rate(500), "4Kbit");
        assert_eq!(format_byte_rate(125_000), "1Mbit");
        assert_eq!(bytes_to_bits(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_format_pps() {
        assert_eq!(format_pps(0), "0pps");
        assert_eq!(format_pps(1_000_000), "1Mpps");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1000), "1000b");
        assert_eq!(format_size(1024 * 1024), "1Mb");
    }
}
