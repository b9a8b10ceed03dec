use serde::{Deserialize, Serialize};

use super::enums::{Onset, Severity};

/// One mention of a symptom in narration, with the attributes found around it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub name: String,
    pub duration: Option<String>,
    pub severity: Option<Severity>,
    pub onset: Option<Onset>,
    pub aggravating_factors: Vec<String>,
    pub relieving_factors: Vec<String>,
    pub associated_symptoms: Vec<String>,
    pub location: Option<String>,
    pub quality: Option<String>,
    pub radiation: Option<String>,
    pub timing: Option<String>,
    /// Narration window the attributes were read from.
    pub context: String,
}

impl Symptom {
    /// A bare symptom record, as a caller would hand it to the reasoner.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn is_pain(&self) -> bool {
        let lower = self.name.to_lowercase();
        lower.contains("pain") || lower.contains("ache")
    }
}
