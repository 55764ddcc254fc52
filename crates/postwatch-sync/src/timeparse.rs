//! Relative-time parsing for scraped publish timestamps.
//!
//! The page renders publish times as short relative phrases — Spanish
//! primarily (`"hace 2 horas"`, `"ayer"`), English as fallback
//! (`"2 hours ago"`, `"yesterday"`). Units are matched by substring in
//! priority order minute, hour, day, week, month; a month is approximated as
//! 30 days and there is no year-level granularity. Matching is done with
//! plain substring scans rather than `regex` — the vocabulary is five unit
//! tokens per locale.
//!
//! "Now" is anchored to a fixed-offset local clock (UTC−5 by default, the
//! channel's timezone) so results do not depend on where the process runs.

use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Fixed offset of the channel's local clock (Colombia, no DST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -5;

/// Upper bound on the parsed amount. Keeps a garbled scraped number from
/// pushing the subtraction outside chrono's representable range.
const MAX_AMOUNT: i64 = 1_000_000;

const SECONDS_PER_HOUR: i32 = 3600;

/// Returns the current instant on the fixed-offset local clock.
///
/// `offset_hours` outside −23..=23 is clamped; configuration validates the
/// range before it gets here.
#[must_use]
pub fn local_now(offset_hours: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_hours.clamp(-23, 23) * SECONDS_PER_HOUR)
        .expect("clamped offset is always in range");
    Utc::now().with_timezone(&offset)
}

/// Converts a relative-time phrase into an absolute instant by subtracting
/// the matched amount from `now`.
///
/// Unrecognized text resolves to `now` with a warning instead of failing, so
/// an unparseable candidate never blocks a batch. The cost is that such a
/// candidate always passes the activation-cutoff check.
#[must_use]
pub fn parse_relative_time(text: &str, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let lower = text.trim().to_lowercase();
    let exact_yesterday = lower == "ayer" || lower == "yesterday";
    let amount = if exact_yesterday {
        1
    } else {
        first_number(&lower).unwrap_or(1).min(MAX_AMOUNT)
    };

    if contains_any(&lower, &["minuto", "minute"]) {
        return now - Duration::minutes(amount);
    }
    if contains_any(&lower, &["hora", "hour"]) {
        return now - Duration::hours(amount);
    }
    if exact_yesterday || contains_any(&lower, &["día", "dia", "day"]) {
        return now - Duration::days(amount);
    }
    if contains_any(&lower, &["semana", "week"]) {
        return now - Duration::weeks(amount);
    }
    if contains_any(&lower, &["mes", "month"]) {
        // No year granularity; a month approximates to 30 days.
        return now - Duration::days(amount * 30);
    }

    tracing::warn!(text, "unrecognized relative time, defaulting to now");
    now
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Extracts the first run of ASCII digits anywhere in the text, so both
/// `"2 days ago"` and `"hace 2 días"` yield 2.
fn first_number(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<i64>().ok()
}
