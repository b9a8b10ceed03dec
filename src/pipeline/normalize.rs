//! Expansion of clinical abbreviations and transliterated Hindi terms.
//!
//! All terms are folded into one alternation ordered longest-first, so a
//! longer phrase ("pet mein dard") always wins over a shorter term it
//! contains ("dard") at the same position.

use std::sync::Arc;

use regex::{Captures, Regex};

use super::text::{bounded_pattern, capitalize, find_term, title_case, window_bounds};
use crate::knowledge::KnowledgeBase;

/// Characters either side of an ambiguous term searched for keywords.
const AMBIGUITY_RADIUS: usize = 40;

pub struct VocabularyNormalizer {
    kb: Arc<KnowledgeBase>,
    matcher: Option<Regex>,
}

impl VocabularyNormalizer {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        let matcher = build_matcher(&kb);
        Self { kb, matcher }
    }

    /// Canonical form of a single term, or `None` when it is not tabled.
    /// Ambiguous short forms return their primary meaning.
    pub fn lookup(&self, term: &str) -> Option<&str> {
        let vocabulary = &self.kb.vocabulary;
        vocabulary
            .expansion(term)
            .or_else(|| vocabulary.ambiguous_term(term).map(|a| a.primary.as_str()))
    }

    /// Pick a meaning for an ambiguous short form using keywords found
    /// around its occurrence in `context`. Unambiguous terms resolve like
    /// [`lookup`](Self::lookup); unknown terms come back unchanged.
    pub fn resolve_ambiguous(&self, term: &str, context: &str) -> String {
        let Some(entry) = self.kb.vocabulary.ambiguous_term(term) else {
            return self.lookup(term).unwrap_or(term).to_string();
        };

        let lower = context.to_lowercase();
        let needle = entry.term.as_str();
        let (nearby, after_count) = match find_term(&lower, needle) {
            Some(start) => {
                let end = start + needle.len();
                let (s, e) = window_bounds(&lower, start, end, AMBIGUITY_RADIUS);
                (&lower[s..e], is_unit_after_count(&lower, start, end))
            }
            None => (lower.as_str(), false),
        };
        self.pick_meaning(term, nearby, after_count)
    }

    /// Replace every tabled term in `text` with its canonical phrase.
    pub fn expand(&self, text: &str) -> String {
        let Some(matcher) = &self.matcher else {
            return text.to_string();
        };

        matcher
            .replace_all(text, |caps: &Captures| {
                let Some(m) = caps.get(0) else {
                    return String::new();
                };
                let found = m.as_str();
                let expansion = match self.kb.vocabulary.ambiguous_term(found) {
                    Some(_) => {
                        let (s, e) = window_bounds(text, m.start(), m.end(), AMBIGUITY_RADIUS);
                        let after_count = is_unit_after_count(text, m.start(), m.end());
                        self.pick_meaning(found, &text[s..e].to_lowercase(), after_count)
                    }
                    None => match self.kb.vocabulary.expansion(found) {
                        Some(exp) => exp.to_string(),
                        None => return found.to_string(),
                    },
                };
                match_casing(found, &expansion)
            })
            .into_owned()
    }

    /// `nearby` must already be lowercase.
    fn pick_meaning(&self, term: &str, nearby: &str, after_count: bool) -> String {
        let Some(entry) = self.kb.vocabulary.ambiguous_term(term) else {
            return term.to_string();
        };
        if let (true, Some(unit)) = (after_count, &entry.after_number) {
            return unit.clone();
        }
        entry
            .alternatives
            .iter()
            .find(|alt| alt.keywords.iter().any(|k| find_term(nearby, k).is_some()))
            .map(|alt| alt.meaning.clone())
            .unwrap_or_else(|| entry.primary.clone())
    }
}

fn build_matcher(kb: &KnowledgeBase) -> Option<Regex> {
    let mut terms: Vec<&str> = kb.vocabulary.all_terms().filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();

    let alternation = terms
        .iter()
        .map(|t| bounded_pattern(t))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!("(?i)(?:{alternation})")) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "Vocabulary matcher failed to compile; expansion disabled");
            None
        }
    }
}

/// A count right before `text[start..end]` and no reading right after it:
/// true for "since 2 hr", false for "BP 120/80 HR 88".
fn is_unit_after_count(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].trim_end();
    let after = text[end..]
        .trim_start()
        .trim_start_matches([':', '=', '-'])
        .trim_start();
    before.ends_with(|c: char| c.is_ascii_digit())
        && !after.starts_with(|c: char| c.is_ascii_digit())
}

/// All-caps source gives a title-cased expansion, a leading capital gives a
/// capitalized one, anything else is lower case.
fn match_casing(source: &str, expansion: &str) -> String {
    let letters: Vec<char> = source.chars().filter(|c| c.is_alphabetic()).collect();
    let lower = expansion.to_lowercase();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        title_case(&lower)
    } else if letters.first().is_some_and(|c| c.is_uppercase()) {
        capitalize(&lower)
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::test_knowledge;

    fn normalizer() -> VocabularyNormalizer {
        VocabularyNormalizer::new(test_knowledge())
    }

    #[test]
    fn expansion_follows_source_casing() {
        let n = normalizer();
        assert_eq!(n.expand("BP"), "Blood Pressure");
        assert_eq!(n.expand("bp"), "blood pressure");
        assert_eq!(n.expand("Bp"), "Blood pressure");
    }

    #[test]
    fn expands_inside_sentences_on_word_boundaries() {
        let n = normalizer();
        assert_eq!(
            n.expand("pt c/o bukhar x 3 din"),
            "patient complaining of fever x 3 days"
        );
        // "bp" inside a word is untouched
        assert_eq!(n.expand("bpm"), "bpm");
    }

    #[test]
    fn longest_term_wins() {
        let n = normalizer();
        assert_eq!(n.expand("pet mein dard since morning"), "abdominal pain since morning");
        assert_eq!(n.expand("k/c/o DM"), "known case of Diabetes Mellitus");
    }

    #[test]
    fn devanagari_terms_expand() {
        let n = normalizer();
        assert_eq!(n.expand("3 दिन से बुखार"), "3 days से fever");
    }

    #[test]
    fn lookup_returns_none_for_unknown_terms() {
        let n = normalizer();
        assert_eq!(n.lookup("HTN"), Some("hypertension"));
        assert_eq!(n.lookup("bukhar"), Some("fever"));
        assert_eq!(n.lookup("zzz"), None);
    }

    #[test]
    fn ambiguous_term_uses_nearby_keywords() {
        let n = normalizer();
        assert_eq!(n.resolve_ambiguous("PP", "PP sugar 180 after meal"), "postprandial");
        assert_eq!(n.resolve_ambiguous("pp", "BP 120/80, pp 40"), "pulse pressure");
    }

    #[test]
    fn ambiguous_term_absent_from_context_checks_whole_context() {
        let n = normalizer();
        assert_eq!(n.resolve_ambiguous("ht", "weight 70 kg"), "height");
        assert_eq!(n.resolve_ambiguous("ht", "on amlodipine"), "hypertension");
    }

    #[test]
    fn ambiguous_terms_expand_in_narration() {
        let n = normalizer();
        assert_eq!(n.expand("wt 70 kg, ht 170 cm"), "wt 70 kg, height 170 cm");
        assert_eq!(n.expand("k/c/o ht on treatment"), "known case of hypertension on treatment");
    }

    #[test]
    fn hr_after_a_count_is_hours() {
        let n = normalizer();
        assert_eq!(n.expand("chest pain since 2 hr"), "chest pain since 2 hours");
        assert_eq!(n.expand("HR 88/min"), "Heart Rate 88/min");
        assert_eq!(n.expand("BP 120/80 HR 88"), "Blood Pressure 120/80 Heart Rate 88");
        assert_eq!(n.resolve_ambiguous("hr", "vomiting x 6 hr"), "hours");
        assert_eq!(n.resolve_ambiguous("hr", "hr 110, irregular"), "heart rate");
    }

    #[test]
    fn pt_beside_coagulation_tests_is_prothrombin_time() {
        let n = normalizer();
        assert_eq!(n.expand("PT INR 1.2"), "Prothrombin Time INR 1.2");
        assert_eq!(n.expand("advised PT, aPTT"), "advised Prothrombin Time, aPTT");
        assert_eq!(n.expand("pt is a known diabetic"), "patient is a known diabetic");
        assert_eq!(n.lookup("pt"), Some("patient"));
    }

    #[test]
    fn unknown_term_resolves_to_itself() {
        let n = normalizer();
        assert_eq!(n.resolve_ambiguous("xyz", "anything"), "xyz");
    }
}
