//! Regular expressions shared across extractors.

use std::sync::LazyLock;

use regex::Regex;

const UNIT: &str = r"(hours?|hrs?|days?|weeks?|wks?|months?|years?|yrs?)";

/// "for 5 days", "since 2 weeks", "x 3 days", "from the last 10 days".
static DURATION_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:for|since|x|from)\s+(?:the\s+)?(?:last\s+|past\s+)?(\d+)\s*{UNIT}\b"
    ))
    .expect("valid duration regex")
});

/// "3 days se", "2 weeks ago".
static DURATION_POSTFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d+)\s*{UNIT}\s+(?:se|ago|back)\b")).expect("valid duration regex")
});

/// "follow up in 2 weeks", "review after 5 days".
pub static FOLLOW_UP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:follow[\s-]*up|review|revisit|come\s+back)\s+(?:in|after)\s+(\d+)\s*{UNIT}\b"
    ))
    .expect("valid follow-up regex")
});

/// Free-text reason after "for", ending at punctuation or a dosing word.
pub static REASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bfor\s+([a-z][a-z \-]{2,40}?)\s*(?:[,.;()]|\s(?:x|for|since|after|before|with|od|bd|tds|qid|hs|sos|on|in|at|done|performed)\b|$)",
    )
    .expect("valid reason regex")
});

/// Leading words that mark a "for ..." phrase as a duration, not a reason.
const NOT_A_REASON: &[&str] = &[
    "the", "last", "past", "next", "a", "an", "few", "one", "two", "three", "several", "some",
];

/// First duration phrase in `text`, normalised to "<n> <unit>".
pub fn parse_duration(text: &str) -> Option<String> {
    let caps = DURATION_PREFIXED
        .captures(text)
        .or_else(|| DURATION_POSTFIXED.captures(text))?;
    let count: u32 = caps.get(1)?.as_str().parse().ok()?;
    let unit = canonical_unit(caps.get(2)?.as_str())?;
    Some(format_count(count, unit))
}

/// "3 days", "1 week".
pub fn format_count(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Singular canonical unit for a duration word.
pub fn canonical_unit(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    let unit = match lower.trim_end_matches('s') {
        "hour" | "hr" => "hour",
        "day" => "day",
        "week" | "wk" => "week",
        "month" => "month",
        "year" | "yr" => "year",
        _ => return None,
    };
    Some(unit)
}

/// Reason phrase ("for hypertension") in `text`, skipping duration phrases.
pub fn parse_reason(text: &str) -> Option<String> {
    REASON.captures_iter(text).find_map(|caps| {
        let phrase = caps.get(1)?.as_str().trim().to_lowercase();
        let first = phrase.split_whitespace().next().unwrap_or_default();
        (!NOT_A_REASON.contains(&first)).then_some(phrase)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_durations() {
        assert_eq!(parse_duration("fever for 5 days").as_deref(), Some("5 days"));
        assert_eq!(parse_duration("cough since 2 wks").as_deref(), Some("2 weeks"));
        assert_eq!(parse_duration("vomiting x 1 day").as_deref(), Some("1 day"));
        assert_eq!(
            parse_duration("pain from the last 10 days").as_deref(),
            Some("10 days")
        );
    }

    #[test]
    fn postfixed_durations() {
        assert_eq!(parse_duration("3 days se bukhar").as_deref(), Some("3 days"));
        assert_eq!(parse_duration("started 2 weeks ago").as_deref(), Some("2 weeks"));
    }

    #[test]
    fn number_without_trigger_is_not_a_duration() {
        assert_eq!(parse_duration("Tab Dolo 650 mg"), None);
        assert_eq!(parse_duration("age 5 years"), None);
    }

    #[test]
    fn reason_skips_duration_phrases() {
        assert_eq!(parse_reason("OD for 5 days for hypertension").as_deref(), Some("hypertension"));
        assert_eq!(parse_reason("for the last week"), None);
        assert_eq!(parse_reason("SOS for fever, x 3 days").as_deref(), Some("fever"));
    }

    #[test]
    fn follow_up_pattern() {
        let caps = FOLLOW_UP.captures("Follow-up after 2 weeks").unwrap();
        assert_eq!(&caps[1], "2");
        assert!(FOLLOW_UP.is_match("review in 5 days"));
    }
}
