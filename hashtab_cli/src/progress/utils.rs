//! Human-readable sizes, rates and durations

use std::time::Duration;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format bytes with binary units
pub fn format_bytes(bytes: u64) -> String {
    let exponent = UNITS
        .iter()
        .enumerate()
        .skip(1)
        .take_while(|(power, _)| bytes >= 1u64 << (10 * power))
        .last()
        .map_or(0, |(power, _)| power);

    if exponent == 0 {
        return format!("{bytes} B");
    }
    let scaled = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{scaled:.2} {}", UNITS[exponent])
}

/// Format the rate at which `bytes` were processed over `elapsed`
///
/// Returns `None` when no measurable time passed.
pub fn format_throughput(bytes: u64, elapsed: Duration) -> Option<String> {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return None;
    }
    let per_second = (bytes as f64 / seconds) as u64;
    Some(format!("{}/s", format_bytes(per_second)))
}

/// Format a duration as hours, minutes and seconds, dropping zero tails
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    match (hours, minutes, seconds) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(1 << 30), "1.00 GB");
        assert_eq!(format_bytes(3 << 40), "3.00 TB");
        assert_eq!(format_bytes(2048 << 40), "2048.00 TB");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(
            format_throughput(512 * 1024, Duration::from_secs(1)).as_deref(),
            Some("512.00 KB/s")
        );
        assert_eq!(
            format_throughput(300 << 20, Duration::from_secs(2)).as_deref(),
            Some("150.00 MB/s")
        );
        assert_eq!(format_throughput(1024, Duration::ZERO), None);
    }

    #[test]
    fn test_format_duration() {
        let secs = Duration::from_secs;
        assert_eq!(format_duration(secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_millis(999)), "0s");
        assert_eq!(format_duration(secs(30)), "30s");
        assert_eq!(format_duration(secs(60)), "1m");
        assert_eq!(format_duration(secs(90)), "1m 30s");
        assert_eq!(format_duration(secs(3600)), "1h");
        assert_eq!(format_duration(secs(3660)), "1h 1m");
        assert_eq!(format_duration(secs(7259)), "2h");
    }
}
