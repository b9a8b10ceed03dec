use std::sync::LazyLock;

use regex::Regex;

use super::patterns::parse_duration;
use super::EntityRecognizer;
use crate::models::{Onset, Severity, Symptom};
use crate::pipeline::text::{clean_phrase, find_term, window_bounds};

/// Bytes either side of a symptom mention searched for attributes.
const SYMPTOM_WINDOW: usize = 100;

const QUALITIES: &[&str] = &[
    "crushing", "squeezing", "pressing", "tearing", "stabbing", "sharp", "dull", "burning",
    "throbbing", "pulsating", "colicky", "cramping", "shooting", "pricking", "aching", "dry",
    "productive",
];

const TIMINGS: &[&str] = &[
    "early morning", "in the morning", "at night", "nocturnal", "in the evening", "on exertion",
    "at rest", "after meals", "after food", "before food", "on lying down", "on and off",
    "intermittent", "continuous", "constant", "episodic",
];

static RADIATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bradiat\w*\s+(?:to(?:wards)?|into|up\s+to|down\s+to)\s+(?:the\s+|both\s+)?([a-z][a-z ]{1,40})")
        .expect("valid radiation regex")
});

static AGGRAVATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:worse|worsens|worsened|worsening|aggravated|aggravates|increases|increased|exacerbated)\s+(?:with|on|by|after|during|when)\s+([a-z][a-z ]{1,40}?)\s*(?:[,.;]|\band\b|\bbut\b|$)",
    )
    .expect("valid aggravating regex")
});

static RELIEVING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:relieved|relieves|better|improves|improved|eased|subsides|settles)\s+(?:with|on|by|after|during|when)\s+([a-z][a-z ]{1,40}?)\s*(?:[,.;]|\band\b|\bbut\b|$)",
    )
    .expect("valid relieving regex")
});

impl EntityRecognizer {
    /// One record per vocabulary symptom mention, with attributes read from
    /// the surrounding window.
    pub fn extract_symptoms(&self, text: &str) -> Vec<Symptom> {
        let mut symptoms = Vec::new();

        for pattern in &self.symptoms {
            for m in pattern.find_iter(text) {
                let (ws, we) = window_bounds(text, m.start(), m.end(), SYMPTOM_WINDOW);
                let context = &text[ws..we];
                let lower = context.to_lowercase();
                let name = pattern.term.as_str();

                let mut symptom = Symptom::named(name);
                symptom.duration = parse_duration(context);
                symptom.severity = self.severity_in(&lower);
                symptom.onset = self.onset_in(&lower);
                symptom.radiation = self.radiation_in(&lower);
                if symptom.is_pain() {
                    symptom.location = self.location_in(
                        &lower,
                        m.start() - ws,
                        m.end() - ws,
                        name,
                        symptom.radiation.as_deref(),
                    );
                }
                symptom.quality = QUALITIES
                    .iter()
                    .find(|q| !name.contains(*q) && find_term(&lower, q).is_some())
                    .map(|q| q.to_string());
                symptom.timing = TIMINGS
                    .iter()
                    .find(|t| find_term(&lower, t).is_some())
                    .map(|t| t.to_string());
                symptom.aggravating_factors = captured_phrases(&AGGRAVATING, &lower);
                symptom.relieving_factors = captured_phrases(&RELIEVING, &lower);
                symptom.associated_symptoms = self
                    .symptoms
                    .iter()
                    .filter(|other| other.term != name && other.is_match(context))
                    .map(|other| other.term.clone())
                    .collect();
                symptom.context = context.trim().to_string();

                symptoms.push(symptom);
            }
        }

        tracing::debug!(count = symptoms.len(), "Extracted symptoms");
        symptoms
    }

    /// Highest tier with a keyword present. `lower` must be lowercase.
    pub fn severity_in(&self, lower: &str) -> Option<Severity> {
        self.kb
            .terminology
            .severity_tiers
            .iter()
            .find(|tier| tier.keywords.iter().any(|k| find_term(lower, k).is_some()))
            .map(|tier| tier.severity)
    }

    pub fn onset_in(&self, lower: &str) -> Option<Onset> {
        self.kb
            .terminology
            .onset_categories
            .iter()
            .find(|cat| cat.keywords.iter().any(|k| find_term(lower, k).is_some()))
            .map(|cat| cat.onset)
    }

    fn radiation_in(&self, lower: &str) -> Option<String> {
        let caps = RADIATION.captures(lower)?;
        let target = caps.get(1)?.as_str();
        self.first_region(target).map(|(_, region)| region.to_string())
    }

    /// Body region closest to the mention, excluding the radiation target
    /// and regions already named by the symptom itself. Falls back to the
    /// region inside the symptom name ("chest" for "chest pain").
    fn location_in(
        &self,
        lower: &str,
        mention_start: usize,
        mention_end: usize,
        name: &str,
        radiation: Option<&str>,
    ) -> Option<String> {
        let regions = &self.kb.terminology.body_regions;
        let mut best: Option<(usize, &str)> = None;

        for region in regions {
            let region = region.as_str();
            if name.contains(region) || radiation == Some(region) {
                continue;
            }
            let Some(pos) = find_term(lower, region) else {
                continue;
            };
            // Region inside the radiation phrase.
            if radiation.is_some_and(|r| r.contains(region)) {
                continue;
            }
            let distance = if pos >= mention_end {
                pos - mention_end
            } else {
                mention_start.saturating_sub(pos + region.len())
            };
            let better = match best {
                None => true,
                Some((d, r)) => distance < d || (distance == d && region.len() > r.len()),
            };
            if better {
                best = Some((distance, region));
            }
        }

        best.map(|(_, r)| r.to_string()).or_else(|| {
            regions
                .iter()
                .filter(|r| find_term(name, r).is_some())
                .max_by_key(|r| r.len())
                .cloned()
        })
    }

    /// Earliest (then longest) body region in `lower`.
    fn first_region<'a>(&'a self, lower: &str) -> Option<(usize, &'a str)> {
        self.kb
            .terminology
            .body_regions
            .iter()
            .filter_map(|r| find_term(lower, r).map(|pos| (pos, r.as_str())))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())))
    }
}

fn captured_phrases(re: &Regex, lower: &str) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();
    for caps in re.captures_iter(lower) {
        if let Some(m) = caps.get(1) {
            let phrase = clean_phrase(m.as_str());
            if !phrase.is_empty() && !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }
    }
    phrases
}
