use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ClinicalContext, Gender, Severity};

/// Probabilistic and safety tables used by the diagnostic reasoner
/// (`evidence.json`). Diagnosis and symptom keys are lowercase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    /// Population prevalence per diagnosis.
    pub priors: BTreeMap<String, f64>,
    /// symptom -> diagnosis -> positive likelihood ratio.
    pub likelihood_ratios: BTreeMap<String, BTreeMap<String, f64>>,
    pub life_threatening: Vec<String>,
    /// diagnosis -> recommended investigation names.
    pub protocols: BTreeMap<String, Vec<String>>,
    pub diagnosis_red_flags: BTreeMap<String, Vec<String>>,
    pub red_flag_rules: Vec<RedFlagRule>,
    pub context_adjustments: Vec<ContextAdjustment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlagRule {
    pub category: String,
    pub description: String,
    pub patterns: Vec<String>,
    pub severity: Severity,
    pub action: String,
    pub body_system: String,
}

/// A multiplier applied to one diagnosis when one patient factor holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAdjustment {
    pub diagnosis: String,
    pub factor: ContextFactor,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContextFactor {
    AgeAbove(u32),
    AgeBelow(u32),
    Condition(String),
    Medication(String),
    Gender(Gender),
    SocialHistory(String),
    FamilyHistory(String),
    PastProcedure(String),
}

impl ContextFactor {
    pub fn applies(&self, context: &ClinicalContext) -> bool {
        match self {
            Self::AgeAbove(limit) => context.age.is_some_and(|age| age > *limit),
            Self::AgeBelow(limit) => context.age.is_some_and(|age| age < *limit),
            Self::Condition(name) => context.has_condition(name),
            Self::Medication(name) => context.takes_medication(name),
            Self::Gender(gender) => context.gender == Some(*gender),
            Self::SocialHistory(term) => context.has_social_history(term),
            Self::FamilyHistory(term) => context.has_family_history(term),
            Self::PastProcedure(term) => context.has_past_procedure(term),
        }
    }
}

impl Evidence {
    pub fn prior(&self, diagnosis: &str) -> Option<f64> {
        self.priors.get(&diagnosis.to_lowercase()).copied()
    }

    pub fn is_life_threatening(&self, diagnosis: &str) -> bool {
        self.life_threatening
            .iter()
            .any(|d| d.eq_ignore_ascii_case(diagnosis))
    }

    pub fn protocol(&self, diagnosis: &str) -> &[String] {
        self.protocols
            .get(&diagnosis.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn red_flags_for(&self, diagnosis: &str) -> &[String] {
        self.diagnosis_red_flags
            .get(&diagnosis.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn adjustments_for<'a>(
        &'a self,
        diagnosis: &'a str,
    ) -> impl Iterator<Item = &'a ContextAdjustment> + 'a {
        self.context_adjustments
            .iter()
            .filter(move |a| a.diagnosis.eq_ignore_ascii_case(diagnosis))
    }
}
