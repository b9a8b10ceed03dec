use std::sync::LazyLock;

use regex::Regex;

use super::{EntityRecognizer, SpanSet};
use crate::models::Diagnosis;
use crate::pipeline::text::{clean_phrase, window};

/// Matches within this many bytes of the section start are primary.
const PRIMARY_OFFSET: usize = 50;
/// Bytes before a match searched for an explicit primary marker.
const MARKER_LOOKBACK: usize = 30;

const PRIMARY_CONFIDENCE: f32 = 0.9;
const DIFFERENTIAL_CONFIDENCE: f32 = 0.7;

static SECTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:impression|diagnosis|assessment|dx)\s*[:\-]")
        .expect("valid diagnosis heading regex")
});

static SECTION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:plan|advice|advised|rx|treatment|medications?|investigations?|follow[\s-]?up)\s*[:\-]",
    )
    .expect("valid section end regex")
});

static PRIMARY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:primary|provisional|working|final|main)\b").expect("valid marker regex")
});

impl EntityRecognizer {
    /// Tabled diagnoses in the impression section (whole text when there is
    /// no heading), ordered by position.
    pub fn extract_diagnoses(&self, text: &str) -> Vec<Diagnosis> {
        let section = diagnosis_section(text);
        let mut spans = SpanSet::default();
        let mut found: Vec<(usize, Diagnosis)> = Vec::new();

        for pattern in &self.diagnoses {
            let Some(m) = pattern
                .find_iter(section)
                .find(|m| spans.claim(m.start(), m.end()))
            else {
                continue;
            };

            let lookback_start = crate::pipeline::text::clamp_to_char_boundary(
                section,
                m.start().saturating_sub(MARKER_LOOKBACK),
                false,
            );
            let marked = PRIMARY_MARKER.is_match(&section[lookback_start..m.start()]);
            let is_primary = m.start() < PRIMARY_OFFSET || marked;

            let name = pattern.term.clone();
            found.push((
                m.start(),
                Diagnosis {
                    code: self.kb.diagnosis_code(&name).map(str::to_string),
                    name,
                    confidence: if is_primary {
                        PRIMARY_CONFIDENCE
                    } else {
                        DIFFERENTIAL_CONFIDENCE
                    },
                    is_primary,
                    is_differential: !is_primary,
                    supporting_evidence: vec![clean_phrase(window(section, m.start(), m.end(), 40))],
                },
            ));
        }

        found.sort_by_key(|(pos, _)| *pos);
        let diagnoses: Vec<Diagnosis> = found.into_iter().map(|(_, d)| d).collect();
        tracing::debug!(count = diagnoses.len(), "Extracted diagnoses");
        diagnoses
    }
}

/// The impression section, or the whole text when there is no heading.
pub fn diagnosis_section(text: &str) -> &str {
    impression_section(text).unwrap_or(text)
}

/// Text between a diagnosis heading and the next plan-type heading.
pub fn impression_section(text: &str) -> Option<&str> {
    let start = SECTION_START.find(text)?;
    let rest = &text[start.end()..];
    Some(match SECTION_END.find(rest) {
        Some(end) => &rest[..end.start()],
        None => rest,
    })
}
