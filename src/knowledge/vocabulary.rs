use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Abbreviation, transliteration and ambiguous short-form tables
/// (`vocabulary.json`). All keys are lowercase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    pub abbreviations: BTreeMap<String, String>,
    pub transliterations: BTreeMap<String, String>,
    #[serde(default)]
    pub ambiguous: Vec<AmbiguousTerm>,
}

/// A short form with one clinically primary meaning and alternatives
/// selected by nearby keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguousTerm {
    pub term: String,
    pub primary: String,
    #[serde(default)]
    pub alternatives: Vec<AlternativeMeaning>,
    /// Meaning when the term is a unit after a count, as in "since 2 hr".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeMeaning {
    pub meaning: String,
    pub keywords: Vec<String>,
}

impl Vocabulary {
    /// Direct expansion for a single term, abbreviations first.
    pub fn expansion(&self, term: &str) -> Option<&str> {
        let key = term.trim().to_lowercase();
        self.abbreviations
            .get(&key)
            .or_else(|| self.transliterations.get(&key))
            .map(String::as_str)
    }

    pub fn ambiguous_term(&self, term: &str) -> Option<&AmbiguousTerm> {
        let key = term.trim().to_lowercase();
        self.ambiguous.iter().find(|a| a.term == key)
    }

    /// Every term the normalizer should recognise.
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        self.abbreviations
            .keys()
            .chain(self.transliterations.keys())
            .map(String::as_str)
            .chain(self.ambiguous.iter().map(|a| a.term.as_str()))
    }
}
