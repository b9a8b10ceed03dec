use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Patient background supplied by the caller alongside the narration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalContext {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub known_conditions: Vec<String>,
    pub current_medications: Vec<String>,
    pub allergies: Vec<String>,
    pub past_procedures: Vec<String>,
    pub family_history: Vec<String>,
    pub social_history: Vec<String>,
    pub recent_labs: BTreeMap<String, String>,
    pub recent_vitals: BTreeMap<String, String>,
}

impl ClinicalContext {
    pub fn has_condition(&self, needle: &str) -> bool {
        contains_ci(&self.known_conditions, needle)
    }

    pub fn takes_medication(&self, needle: &str) -> bool {
        contains_ci(&self.current_medications, needle)
    }

    pub fn has_social_history(&self, needle: &str) -> bool {
        contains_ci(&self.social_history, needle)
    }

    pub fn has_family_history(&self, needle: &str) -> bool {
        contains_ci(&self.family_history, needle)
    }

    pub fn has_past_procedure(&self, needle: &str) -> bool {
        contains_ci(&self.past_procedures, needle)
    }
}

/// Case-insensitive substring match against any entry.
fn contains_ci(entries: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    entries.iter().any(|e| e.to_lowercase().contains(&needle))
}
