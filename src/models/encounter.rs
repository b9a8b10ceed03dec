use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::diagnosis::Diagnosis;
use super::drug::Drug;
use super::investigation::Investigation;
use super::procedure::Procedure;
use super::vital_sign::VitalSign;

/// A clinical note structured into subjective, objective, assessment and plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub subjective: Subjective,
    pub objective: Objective,
    pub assessment: Assessment,
    pub plan: Plan,
    pub metadata: EncounterMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subjective {
    pub chief_complaint: String,
    pub history: String,
    pub associated_symptoms: Vec<String>,
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Objective {
    /// Keyed by `VitalType::key()` ("BP", "Pulse", "SpO2", ...).
    pub vitals: BTreeMap<String, VitalSign>,
    pub examination_findings: Vec<String>,
}

impl Objective {
    /// Vitals as "key → value" strings, the shape red-flag screening takes.
    pub fn vital_readings(&self) -> BTreeMap<String, String> {
        self.vitals
            .iter()
            .map(|(key, vital)| (key.clone(), vital.value.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assessment {
    pub diagnoses: Vec<Diagnosis>,
    pub differentials: Vec<Diagnosis>,
    pub impression: String,
}

impl Assessment {
    pub fn primary_diagnosis(&self) -> Option<&Diagnosis> {
        self.diagnoses.iter().find(|d| d.is_primary)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub medications: Vec<Drug>,
    pub investigations: Vec<Investigation>,
    pub procedures: Vec<Procedure>,
    pub advice: Vec<String>,
    pub follow_up: String,
    pub referrals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterMetadata {
    pub confidence: f32,
    pub created_at: DateTime<Utc>,
    pub raw_text: String,
}

impl EncounterMetadata {
    pub fn new(raw_text: &str) -> Self {
        Self {
            confidence: 1.0,
            created_at: Utc::now(),
            raw_text: raw_text.to_string(),
        }
    }
}

impl Encounter {
    /// An encounter with every field blank, carrying only the source text.
    pub fn empty(raw_text: &str) -> Self {
        Self {
            subjective: Subjective::default(),
            objective: Objective::default(),
            assessment: Assessment::default(),
            plan: Plan::default(),
            metadata: EncounterMetadata::new(raw_text),
        }
    }
}
