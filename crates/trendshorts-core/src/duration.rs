//! ISO-8601 duration helpers restricted to the `PT#H#M#S` subset.

use std::sync::LazyLock;

use regex::Regex;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid ISO duration regex")
});

/// Upper bound (inclusive) for a video to count as short-form.
pub const SHORT_FORM_MAX_SECS: u64 = 60;

/// Formats a second count as `PT{s}S`, `PT{m}M{s}S`, or `PT{h}H{m}M{s}S`.
///
/// Zero becomes `PT0S`.
#[must_use]
pub fn iso_duration_from_secs(secs: u64) -> String {
    if secs < 60 {
        format!("PT{secs}S")
    } else if secs < 3600 {
        format!("PT{}M{}S", secs / 60, secs % 60)
    } else {
        format!(
            "PT{}H{}M{}S",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }
}

/// Parses the `PT#H#M#S` subset back into seconds.
///
/// Returns `None` for anything outside that notation, including the bare `PT`.
#[must_use]
pub fn parse_iso_duration_secs(raw: &str) -> Option<u64> {
    if raw == "PT" {
        return None;
    }
    let caps = ISO_DURATION.captures(raw)?;
    let part = |idx: usize| -> Option<u64> {
        caps.get(idx)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };
    let hours = part(1)?;
    let minutes = part(2)?;
    let seconds = part(3)?;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

/// `true` iff `0 < secs <= 60`.
#[must_use]
pub fn is_short_form_secs(secs: u64) -> bool {
    secs > 0 && secs <= SHORT_FORM_MAX_SECS
}
