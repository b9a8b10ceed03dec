use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{EntityRecognizer, SpanSet};
use crate::models::Procedure;
use crate::pipeline::text::{clean_phrase, find_term, tail};

/// Bytes after a procedure name searched for date, indication and outcome.
const PROCEDURE_WINDOW: usize = 80;

/// Canonical outcome for each keyword, checked in order.
const OUTCOMES: &[(&str, &str)] = &[
    ("uneventful", "uneventful"),
    ("uncomplicated", "uncomplicated"),
    ("unsuccessful", "failed"),
    ("successfully", "successful"),
    ("successful", "successful"),
    ("failed", "failed"),
    ("complicated", "complicated"),
    ("abandoned", "failed"),
];

static DATE_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})\b").expect("valid date regex")
});

static DATE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid ISO date regex")
});

static DATE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\s*,?\s+(\d{4})\b")
        .expect("valid day-month date regex")
});

static DATE_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\s*,?\s+(\d{4})\b").expect("valid month-year regex")
});

static INDICATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+([a-z][a-z \-]{2,40}?)\s*(?:[,.;()]|\s(?:on|in|at|done|performed|with|under|was|which)\b|$)")
        .expect("valid indication regex")
});

static COMPLICATIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcomplicated\s+by\s+([a-z][a-z ,]{2,60}?)\s*(?:[.;]|$)")
        .expect("valid complications regex")
});

impl EntityRecognizer {
    /// Tabled procedures, first occurrence per name, ordered by position.
    pub fn extract_procedures(&self, text: &str) -> Vec<Procedure> {
        let mut spans = SpanSet::default();
        let mut found: Vec<(usize, Procedure)> = Vec::new();

        for (pattern, kind) in &self.procedures {
            let Some(m) = pattern
                .find_iter(text)
                .find(|m| spans.claim(m.start(), m.end()))
            else {
                continue;
            };

            let after = tail(text, m.end(), PROCEDURE_WINDOW);
            let lower = after.to_lowercase();

            let outcome = OUTCOMES
                .iter()
                .find(|(keyword, _)| find_term(&lower, keyword).is_some())
                .map(|(_, outcome)| outcome.to_string());

            let complications = COMPLICATIONS
                .captures(&lower)
                .and_then(|c| c.get(1))
                .map(|list| split_list(list.as_str()))
                .unwrap_or_default();

            found.push((
                m.start(),
                Procedure {
                    name: pattern.term.clone(),
                    kind: *kind,
                    indication: INDICATION
                        .captures(&lower)
                        .and_then(|c| c.get(1))
                        .map(|i| clean_phrase(i.as_str())),
                    date_performed: parse_date(after),
                    outcome,
                    complications,
                },
            ));
        }

        found.sort_by_key(|(pos, _)| *pos);
        let procedures: Vec<Procedure> = found.into_iter().map(|(_, p)| p).collect();
        tracing::debug!(count = procedures.len(), "Extracted procedures");
        procedures
    }
}

/// First parsable date in `text`. Month-only dates resolve to the 1st.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Some(c) = DATE_ISO.captures(text) {
        if let Some(date) = ymd(&c[1], &c[2], &c[3]) {
            return Some(date);
        }
    }
    if let Some(c) = DATE_DMY.captures(text) {
        if let Some(date) = ymd(&c[3], &c[2], &c[1]) {
            return Some(date);
        }
    }
    for c in DATE_DAY_MONTH.captures_iter(text) {
        if let Some(month) = month_number(&c[2]) {
            let year: i32 = c[3].parse().ok()?;
            let day: u32 = c[1].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }
    for c in DATE_MONTH_YEAR.captures_iter(text) {
        if let Some(month) = month_number(&c[1]) {
            let year: i32 = c[2].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, 1);
        }
    }
    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    const FULL: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .zip(FULL.iter())
        .position(|(short, full)| lower == *short || lower == *full || (lower == "sept" && *short == "sep"))
        .map(|i| i as u32 + 1)
}

fn split_list(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .flat_map(|part| part.split(" and "))
        .map(clean_phrase)
        .filter(|p| !p.is_empty())
        .collect()
}
