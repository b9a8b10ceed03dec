use std::sync::LazyLock;

use regex::Regex;

use super::{EntityRecognizer, SpanSet};
use crate::models::{Investigation, Urgency};
use crate::pipeline::text::{clean_phrase, find_term, tail, window};

const TIMING_WINDOW: usize = 60;

/// Longest first so "tomorrow morning" wins over "tomorrow".
const TIMINGS: &[&str] = &[
    "tomorrow morning", "before next visit", "immediately", "tomorrow", "tonight", "today",
    "fasting", "now",
];

static RULE_OUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:to\s+rule\s+out|rule\s+out|r/o|to\s+exclude|for)\s+([a-z][a-z0-9 \-]{2,40}?)\s*(?:[,.;()]|\band\b|$)")
        .expect("valid rule-out regex")
});

impl EntityRecognizer {
    /// Tabled investigations, first occurrence per name, ordered by position.
    pub fn extract_investigations(&self, text: &str) -> Vec<Investigation> {
        let lower = text.to_lowercase();
        let urgency = if find_term(&lower, "emergency").is_some() {
            Urgency::Stat
        } else if find_term(&lower, "urgent").is_some() || find_term(&lower, "urgently").is_some() {
            Urgency::Urgent
        } else {
            Urgency::Routine
        };

        let mut spans = SpanSet::default();
        let mut found: Vec<(usize, Investigation)> = Vec::new();

        for (pattern, kind) in &self.investigations {
            let Some(m) = pattern
                .find_iter(text)
                .find(|m| spans.claim(m.start(), m.end()))
            else {
                continue;
            };

            let after = tail(text, m.end(), TIMING_WINDOW);
            let after_lower = after.to_lowercase();
            let nearby = window(text, m.start(), m.end(), TIMING_WINDOW).to_lowercase();

            found.push((
                m.start(),
                Investigation {
                    name: m.as_str().to_string(),
                    kind: *kind,
                    urgency,
                    reason: RULE_OUT
                        .captures(&after_lower)
                        .and_then(|c| c.get(1))
                        .map(|r| clean_phrase(r.as_str()))
                        .filter(|r| r.split_whitespace().next().is_some_and(|w| !w.chars().all(|c| c.is_ascii_digit()))),
                    timing: TIMINGS
                        .iter()
                        .find(|t| find_term(&nearby, t).is_some())
                        .map(|t| t.to_string()),
                    context: clean_phrase(window(text, m.start(), m.end(), 40)),
                },
            ));
        }

        found.sort_by_key(|(pos, _)| *pos);
        // Collapse repeated names (different surface forms of the same term).
        let mut investigations: Vec<Investigation> = Vec::with_capacity(found.len());
        for (_, inv) in found {
            if !investigations
                .iter()
                .any(|i| i.name.eq_ignore_ascii_case(&inv.name))
            {
                investigations.push(inv);
            }
        }

        tracing::debug!(count = investigations.len(), "Extracted investigations");
        investigations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::test_knowledge;
    use crate::models::InvestigationKind;

    fn recognizer() -> EntityRecognizer {
        EntityRecognizer::new(test_knowledge())
    }

    #[test]
    fn kinds_follow_vocabulary() {
        let inv = recognizer().extract_investigations("Advised CBC, chest X-ray and ECG");
        let names: Vec<&str> = inv.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["CBC", "chest X-ray", "ECG"]);
        assert_eq!(inv[0].kind, InvestigationKind::Lab);
        assert_eq!(inv[1].kind, InvestigationKind::Imaging);
        assert_eq!(inv[2].kind, InvestigationKind::Procedure);
    }

    #[test]
    fn longer_term_suppresses_contained_term() {
        let inv = recognizer().extract_investigations("chest x-ray PA view");
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].name, "chest x-ray");
    }

    #[test]
    fn duplicates_collapse_to_first() {
        let inv = recognizer().extract_investigations("ECG now. Repeat ECG after 6 hours.");
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].timing.as_deref(), Some("now"));
    }

    #[test]
    fn urgency_escalates_from_anywhere_in_text() {
        let inv = recognizer().extract_investigations("Troponin I. Shift to emergency.");
        assert_eq!(inv[0].urgency, Urgency::Stat);

        let inv = recognizer().extract_investigations("Urgent CBC");
        assert_eq!(inv[0].urgency, Urgency::Urgent);

        let inv = recognizer().extract_investigations("CBC");
        assert_eq!(inv[0].urgency, Urgency::Routine);
    }

    #[test]
    fn rule_out_reason_is_captured() {
        let inv = recognizer().extract_investigations("NS1 antigen to rule out dengue, CBC");
        assert_eq!(inv[0].reason.as_deref(), Some("dengue"));
    }

    #[test]
    fn fasting_timing() {
        let inv = recognizer().extract_investigations("lipid profile fasting tomorrow morning");
        assert_eq!(inv[0].timing.as_deref(), Some("tomorrow morning"));
    }
}
