use std::sync::LazyLock;

use regex::Regex;

use super::correction::closest_term;
use super::patterns::{parse_duration, parse_reason};
use super::EntityRecognizer;
use crate::models::{Drug, Frequency, Route};
use crate::pipeline::text::{clean_phrase, find_term, tail};

/// Bytes after a prescription line searched for dosing details.
const DRUG_WINDOW: usize = 80;

/// "{form} {name tokens} {strength}", e.g. "Tab. Dolo 650mg".
static PRESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(tablets?|tabs?|capsules?|caps?|syrup|syp|suspension|susp|injection|inj|ointment|oint|cream|gel|lotion|inhaler|rotacaps?|nebuli[sz]ation|neb|eye\s+drops|ear\s+drops|drops|sachet|suppository|supp)\b\.?\s+([a-z][a-z\-]*(?:\s+[a-z][a-z\-]*){0,2}?)\s*(\d+(?:\.\d+)?\s*(?:(?:mg|mcg|gm|g|ml|iu|units?)\b|%)?)",
    )
    .expect("valid prescription regex")
});

static FREQUENCY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(od|bd|bid|tds|tid|qid|qds|hs|sos|prn|stat|weekly)\b")
        .expect("valid frequency regex")
});

/// Indian dosing notation: morning-afternoon-night, e.g. "1-0-1".
static DOSING_NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01])\s*-\s*([01])\s*-\s*([01])\b").expect("valid dosing notation regex")
});

static DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?|half|one|two)\s*(tabs?|tablets?|caps?|capsules?|ml|puffs?|drops?|sachets?)\b")
        .expect("valid dose regex")
});

const SPELLED_FREQUENCIES: &[(&str, Frequency)] = &[
    ("once daily", Frequency::Od),
    ("once a day", Frequency::Od),
    ("twice daily", Frequency::Bd),
    ("twice a day", Frequency::Bd),
    ("thrice daily", Frequency::Tds),
    ("three times a day", Frequency::Tds),
    ("four times a day", Frequency::Qid),
    ("at bedtime", Frequency::Hs),
    ("as needed", Frequency::Sos),
    ("when required", Frequency::Sos),
    ("if required", Frequency::Sos),
    ("once a week", Frequency::Weekly),
    ("once weekly", Frequency::Weekly),
];

const MEAL_INSTRUCTIONS: &[&str] = &[
    "after food", "after meals", "after meal", "before food", "before meals", "before meal",
    "empty stomach", "with food", "with meals", "with milk", "at bedtime",
];

impl EntityRecognizer {
    /// One record per prescription phrase.
    pub fn extract_drugs(&self, text: &str) -> Vec<Drug> {
        let matches: Vec<regex::Captures> = PRESCRIPTION.captures_iter(text).collect();
        let mut drugs = Vec::with_capacity(matches.len());

        for (i, caps) in matches.iter().enumerate() {
            let (Some(whole), Some(form), Some(name), Some(strength)) =
                (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };

            let limit = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(DRUG_WINDOW, |next| (next.start() - whole.end()).min(DRUG_WINDOW));
            let details = tail(text, whole.end(), limit);
            let lower = details.to_lowercase();

            let written = clean_phrase(name.as_str());
            let (generic_name, brand_name) = self.resolve_drug_name(&written);

            let mut route = route_for_form(form.as_str());
            if find_term(&lower, "sublingual").is_some() || find_term(&lower, "s/l").is_some() {
                route = Route::Sublingual;
            }

            let instructions = MEAL_INSTRUCTIONS
                .iter()
                .filter(|p| find_term(&lower, p).is_some())
                .map(|p| p.to_string())
                .collect();

            drugs.push(Drug {
                name: written,
                generic_name,
                brand_name,
                dose: DOSE
                    .captures(&lower)
                    .and_then(|c| c.get(0))
                    .map(|m| clean_phrase(m.as_str())),
                strength: Some(strength.as_str().split_whitespace().collect()),
                route,
                frequency: frequency_in(&lower).unwrap_or_default(),
                duration: parse_duration(details),
                instructions,
                reason: parse_reason(details),
                context: format!("{}{}", whole.as_str(), details).trim().to_string(),
            });
        }

        tracing::debug!(count = drugs.len(), "Extracted drugs");
        drugs
    }

    /// (generic, brand) for a written name: brand cross-reference, then
    /// exact generic, then an unambiguous close generic.
    fn resolve_drug_name(&self, written: &str) -> (Option<String>, Option<String>) {
        let terminology = &self.kb.terminology;
        let first = written.split_whitespace().next().unwrap_or(written);

        for candidate in [written, first] {
            if let Some(generic) = terminology.generic_for_brand(candidate) {
                return (Some(generic.to_string()), Some(candidate.to_string()));
            }
        }
        for candidate in [written, first] {
            if terminology.is_generic(candidate) {
                return (Some(candidate.to_lowercase()), None);
            }
        }
        for candidate in [written, first] {
            if let Some(generic) = closest_term(candidate, &terminology.generic_drugs) {
                return (Some(generic.to_string()), None);
            }
        }
        (None, None)
    }
}

fn route_for_form(form: &str) -> Route {
    let form = form.to_lowercase();
    if form.starts_with("inj") {
        Route::Parenteral
    } else if ["oint", "cream", "gel", "lotion", "ear"].iter().any(|f| form.starts_with(f)) {
        Route::Topical
    } else if ["inhaler", "rotacap", "neb"].iter().any(|f| form.starts_with(f)) {
        Route::Inhalation
    } else if form.starts_with("eye") {
        Route::Ophthalmic
    } else if form.starts_with("supp") {
        Route::Rectal
    } else {
        Route::Oral
    }
}

/// Earliest frequency expression in `lower`.
fn frequency_in(lower: &str) -> Option<Frequency> {
    let mut candidates: Vec<(usize, Frequency)> = Vec::new();

    if let Some(caps) = FREQUENCY_CODE.captures(lower) {
        if let (Some(m), Some(code)) = (caps.get(0), caps.get(1)) {
            let freq = match code.as_str() {
                "od" => Some(Frequency::Od),
                "bd" | "bid" => Some(Frequency::Bd),
                "tds" | "tid" => Some(Frequency::Tds),
                "qid" | "qds" => Some(Frequency::Qid),
                "hs" => Some(Frequency::Hs),
                "sos" | "prn" => Some(Frequency::Sos),
                "stat" => Some(Frequency::Stat),
                "weekly" => Some(Frequency::Weekly),
                _ => None,
            };
            if let Some(freq) = freq {
                candidates.push((m.start(), freq));
            }
        }
    }

    if let Some(caps) = DOSING_NOTATION.captures(lower) {
        if let Some(m) = caps.get(0) {
            let slots: Vec<bool> = (1..=3).map(|i| caps.get(i).is_some_and(|s| s.as_str() == "1")).collect();
            let freq = match slots.iter().filter(|s| **s).count() {
                3 => Some(Frequency::Tds),
                2 => Some(Frequency::Bd),
                1 if slots[2] => Some(Frequency::Hs),
                1 => Some(Frequency::Od),
                _ => None,
            };
            if let Some(freq) = freq {
                candidates.push((m.start(), freq));
            }
        }
    }

    for (phrase, freq) in SPELLED_FREQUENCIES {
        if let Some(pos) = find_term(lower, phrase) {
            candidates.push((pos, *freq));
        }
    }

    candidates.into_iter().min_by_key(|(pos, _)| *pos).map(|(_, f)| f)
}
