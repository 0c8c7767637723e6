//! Compact duration notation (`2h15m`) to and from minute counts.
//!
//! Decoding is best-effort: components that fail to parse count as zero
//! instead of producing an error.

/// Parses `[<H>h][<M>m]` into minutes.
///
/// Malformed or missing components contribute zero, so `decode("")` and
/// `decode("soon")` both return 0.
pub fn decode(text: &str) -> u64 {
    let text = text.trim();

    let (hours, rest) = match text.split_once('h') {
        Some((hours, rest)) => (leading_number(hours), rest),
        None => (0, text),
    };

    // "2h15" has no minute marker, so the trailing digits are ignored
    let minutes = if rest.contains('m') {
        leading_number(rest)
    } else {
        0
    };

    hours.saturating_mul(60).saturating_add(minutes)
}

/// Formats minutes in canonical notation: `2h15m`, `3h`, `45m` or `0m`.
pub fn encode(minutes: u64) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;

    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}

/// Reads the run of ASCII digits at the start of `s`, or 0 if there is none.
fn leading_number(s: &str) -> u64 {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().unwrap_or(0)
}
