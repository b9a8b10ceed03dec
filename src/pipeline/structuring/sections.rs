//! Free-text sections of a note: complaint, history, findings, advice,
//! follow-up and referrals. All functions take normalized text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Diagnosis;
use crate::pipeline::extraction::diagnoses::impression_section;
use crate::pipeline::extraction::patterns::{canonical_unit, format_count, FOLLOW_UP};
use crate::pipeline::text::clean_phrase;

/// First word of an advice clause.
const IMPERATIVES: &[&str] = &[
    "avoid", "drink", "rest", "continue", "stop", "monitor", "reduce", "increase", "maintain",
    "eat", "walk", "exercise", "return", "report", "check", "take", "keep", "apply", "use",
];

static CHIEF_COMPLAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:chief\s+complaints?|presenting\s+complaints?|complain(?:ing|s|ed)?\s+of|complaints?\s+of|presents?\s+with|presented\s+with|came\s+with|comes\s+with|cc)\s*[:\-]?\s*([^.\n;]+)",
    )
    .expect("valid chief complaint regex")
});

static HISTORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(no\s+)?(?:history\s+of|known\s+case\s+of|past\s+history)\s*[:\-]?\s*([^.\n;]+)")
        .expect("valid history regex")
});

static EXAMINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:on\s+examination|general\s+examination|examination|exam|findings)\s*[:\-]?\s*")
        .expect("valid examination heading regex")
});

/// Headings that end the examination section.
static EXAMINATION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:impression|diagnosis|assessment|dx|plan|advice|advised|rx|treatment|medications?|investigations?|follow[\s-]?up|review)\b",
    )
    .expect("valid examination end regex")
});

static SYSTEM_FINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(cardiovascular\s+system|central\s+nervous\s+system|respiratory\s+system|per\s+abdomen|rs|chest|abdomen|throat)\s*[:\-]\s*([^,;.\n]+)",
    )
    .expect("valid system finding regex")
});

/// Fragments that are vital readings rather than findings.
static VITAL_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:blood\s+pressure|bp|pulse(?:\s+rate)?|heart\s+rate|temp(?:erature)?|spo2|oxygen\s+saturation|respiratory\s+rate|weight|wt|height|ht|bmi)\b",
    )
    .expect("valid vital fragment regex")
});

/// Splits findings on commas and semicolons, and on full stops that are
/// not decimal points.
static FRAGMENT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]|\.(?:\s|$)").expect("valid fragment split regex"));

static ADVICE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:patient\s+)?(?:advice|advised|adv)\b\s*[:\-]?\s*(?:to\s+)?)")
        .expect("valid advice prefix regex")
});

static REFERRAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\brefer(?:red|ral)?\s+to\s+(?:an?\s+|the\s+)?([a-z][a-z \-]{2,40}?)\s*(?:[,.;\n]|\b(?:for|if|in|immediately|urgently)\b|$)",
    )
    .expect("valid referral regex")
});

/// Text after a complaint marker, else the first sentence.
pub fn chief_complaint(text: &str) -> String {
    if let Some(complaint) = CHIEF_COMPLAINT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean_phrase(m.as_str()))
        .filter(|c| !c.is_empty())
    {
        return complaint;
    }

    text.split(['.', '\n', '?', '!'])
        .map(clean_phrase)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// "history of …" phrases, joined with "; ". Negated history keeps its "no".
pub fn history(text: &str) -> String {
    let mut items: Vec<String> = Vec::new();
    for caps in HISTORY.captures_iter(text) {
        let Some(phrase) = caps.get(2).map(|m| clean_phrase(m.as_str())) else {
            continue;
        };
        if phrase.is_empty() {
            continue;
        }
        let item = if caps.get(1).is_some() {
            format!("no {phrase}")
        } else {
            phrase
        };
        if !items.contains(&item) {
            items.push(item);
        }
    }
    items.join("; ")
}

/// Findings after an examination heading, plus "system: finding" pairs
/// anywhere in the note. Vital readings are left to the vitals extractor.
pub fn examination_findings(text: &str) -> Vec<String> {
    let mut findings: Vec<String> = Vec::new();

    if let Some(heading) = EXAMINATION.find(text) {
        let rest = &text[heading.end()..];
        let end = [
            EXAMINATION_END.find(rest).map(|m| m.start()),
            rest.find('\n'),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());

        for fragment in FRAGMENT_SPLIT.split(&rest[..end]) {
            let fragment = clean_phrase(fragment);
            if fragment.is_empty() || VITAL_FRAGMENT.is_match(&fragment) {
                continue;
            }
            if !findings.contains(&fragment) {
                findings.push(fragment);
            }
        }
    }

    for caps in SYSTEM_FINDING.captures_iter(text) {
        let (Some(system), Some(finding)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let finding = clean_phrase(finding.as_str());
        if finding.is_empty() || findings.iter().any(|f| f.contains(&finding)) {
            continue;
        }
        findings.push(format!("{}: {}", clean_phrase(system.as_str()), finding));
    }

    findings
}

/// Clauses that open with an imperative verb, with any "advised to"
/// lead-in removed.
pub fn advice(text: &str) -> Vec<String> {
    let mut advice: Vec<String> = Vec::new();

    for sentence in text.split(['.', '\n', ';']) {
        for clause in sentence.split(',') {
            let clause = clean_phrase(clause);
            let clause = ADVICE_PREFIX.replace(&clause, "");
            let clause = clean_phrase(&clause);
            let lower = clause.to_lowercase();

            let imperative = lower.starts_with("do not ")
                || lower.starts_with("don't ")
                || lower
                    .split_whitespace()
                    .next()
                    .is_some_and(|first| IMPERATIVES.contains(&first));
            if imperative && !advice.contains(&clause) {
                advice.push(clause);
            }
        }
    }

    advice
}

/// Follow-up interval as "<n> <unit>", blank when none is given.
pub fn follow_up(text: &str) -> String {
    FOLLOW_UP
        .captures(text)
        .and_then(|caps| {
            let count: u32 = caps.get(1)?.as_str().parse().ok()?;
            let unit = canonical_unit(caps.get(2)?.as_str())?;
            Some(format_count(count, unit))
        })
        .unwrap_or_default()
}

pub fn referrals(text: &str) -> Vec<String> {
    let mut referrals: Vec<String> = Vec::new();
    for caps in REFERRAL.captures_iter(text) {
        if let Some(target) = caps.get(1).map(|m| clean_phrase(m.as_str())) {
            if !target.is_empty() && !referrals.contains(&target) {
                referrals.push(target);
            }
        }
    }
    referrals
}

/// Impression section text, else the primary diagnosis names.
pub fn impression(text: &str, diagnoses: &[Diagnosis]) -> String {
    impression_section(text)
        .map(clean_phrase)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            diagnoses
                .iter()
                .filter(|d| d.is_primary)
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complaint_after_marker() {
        assert_eq!(
            chief_complaint("patient complaining of fever x 3 days. On Examination stable"),
            "fever x 3 days"
        );
        assert_eq!(chief_complaint("Chief complaint: headache\nBP 120/80"), "headache");
    }

    #[test]
    fn complaint_falls_back_to_first_sentence() {
        assert_eq!(chief_complaint("  Giddiness on standing. BP 100/60"), "Giddiness on standing");
        assert_eq!(chief_complaint(""), "");
    }

    #[test]
    fn history_phrases_are_collected() {
        let text = "History of Diabetes Mellitus since 5 years. known case of hypertension. \
                    no history of asthma";
        assert_eq!(
            history(text),
            "Diabetes Mellitus since 5 years; hypertension; no asthma"
        );
        assert_eq!(history("fever since morning"), "");
    }

    #[test]
    fn findings_after_heading_skip_vitals() {
        let text = "On Examination blood pressure 150/95, throat congested, chest clear. \
                    Impression: viral fever";
        assert_eq!(examination_findings(text), vec!["throat congested", "chest clear"]);
    }

    #[test]
    fn system_findings_anywhere() {
        let text = "cardiovascular system: S1 S2 heard, per abdomen: soft, non-tender";
        assert_eq!(
            examination_findings(text),
            vec!["cardiovascular system: S1 S2 heard", "per abdomen: soft"]
        );
    }

    #[test]
    fn decimal_points_do_not_split_findings() {
        let findings = examination_findings("Exam: temp 38.5 noted, pallor present");
        assert_eq!(findings, vec!["pallor present"]);
    }

    #[test]
    fn advice_from_imperatives() {
        let text = "Advice: drink plenty of fluids, rest. Tab Dolo 650mg TDS. \
                    Patient advised to avoid oily food. Do not skip meals";
        assert_eq!(
            advice(text),
            vec!["drink plenty of fluids", "rest", "avoid oily food", "Do not skip meals"]
        );
    }

    #[test]
    fn follow_up_interval() {
        assert_eq!(follow_up("Review after 3 days"), "3 days");
        assert_eq!(follow_up("follow-up in 1 week with reports"), "1 week");
        assert_eq!(follow_up("come back if worse"), "");
    }

    #[test]
    fn referral_targets() {
        let text = "Refer to ENT surgeon if no improvement. referred to the cardiologist.";
        assert_eq!(referrals(text), vec!["ENT surgeon", "cardiologist"]);
    }

    #[test]
    fn impression_prefers_section_text() {
        let dx = vec![Diagnosis {
            name: "viral fever".into(),
            code: None,
            confidence: 0.9,
            is_primary: true,
            is_differential: false,
            supporting_evidence: vec![],
        }];
        assert_eq!(impression("Impression: likely viral fever. Plan: rest", &dx), "likely viral fever");
        assert_eq!(impression("fever with chills", &dx), "viral fever");
        assert_eq!(impression("fever with chills", &[]), "");
    }
}
