//! Human-readable renderings used by reports.

use crate::duration::parse_iso_duration_secs;

/// Renders a count as `1.2M`, `3.4K`, or the plain number below one thousand.
#[must_use]
pub fn format_compact_count(count: i64) -> String {
    #[allow(clippy::cast_precision_loss)] // display only
    let value = count as f64;
    if count >= 1_000_000 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Renders `PT4M13S` as `4:13` and `PT1H2M3S` as `1:02:03`.
///
/// Empty input reads `Unknown`; unparseable input is returned unchanged.
#[must_use]
pub fn format_clock_duration(iso: &str) -> String {
    if iso.is_empty() {
        return "Unknown".to_string();
    }
    let Some(total) = parse_iso_duration_secs(iso) else {
        return iso.to_string();
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_count_thresholds() {
        assert_eq!(format_compact_count(999), "999");
        assert_eq!(format_compact_count(1_500), "1.5K");
        assert_eq!(format_compact_count(2_340_000), "2.3M");
    }

    #[test]
    fn clock_duration_minutes_and_hours() {
        assert_eq!(format_clock_duration("PT45S"), "0:45");
        assert_eq!(format_clock_duration("PT4M13S"), "4:13");
        assert_eq!(format_clock_duration("PT1H2M3S"), "1:02:03");
    }

    #[test]
    fn clock_duration_passthrough_and_unknown() {
        assert_eq!(format_clock_duration(""), "Unknown");
        assert_eq!(format_clock_duration("P1D"), "P1D");
    }
}
