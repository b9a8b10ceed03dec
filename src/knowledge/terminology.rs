use serde::{Deserialize, Serialize};

use crate::models::{InvestigationKind, Onset, ProcedureKind, Severity};

/// Clinical vocabularies used by the entity recognizer (`terminology.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Terminology {
    pub symptoms: Vec<String>,
    pub body_regions: Vec<String>,
    /// Ordered from most to least severe; first hit wins.
    pub severity_tiers: Vec<SeverityTier>,
    pub onset_categories: Vec<OnsetCategory>,
    pub diagnoses: Vec<DiagnosisEntry>,
    pub generic_drugs: Vec<String>,
    pub drug_aliases: Vec<DrugAlias>,
    pub lab_tests: Vec<String>,
    pub imaging_studies: Vec<String>,
    pub diagnostic_procedures: Vec<String>,
    pub procedures: Vec<ProcedureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityTier {
    pub severity: Severity,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnsetCategory {
    pub onset: Onset,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisEntry {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Brand-to-generic cross-reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugAlias {
    pub brand: String,
    pub generic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureEntry {
    pub name: String,
    pub kind: ProcedureKind,
}

impl Terminology {
    /// Investigation vocabularies tagged with their kind.
    pub fn investigation_terms(&self) -> Vec<(&str, InvestigationKind)> {
        let labs = self.lab_tests.iter().map(|t| (t.as_str(), InvestigationKind::Lab));
        let imaging = self
            .imaging_studies
            .iter()
            .map(|t| (t.as_str(), InvestigationKind::Imaging));
        let procedures = self
            .diagnostic_procedures
            .iter()
            .map(|t| (t.as_str(), InvestigationKind::Procedure));
        labs.chain(imaging).chain(procedures).collect()
    }

    pub fn diagnosis(&self, name: &str) -> Option<&DiagnosisEntry> {
        let key = name.trim().to_lowercase();
        self.diagnoses.iter().find(|d| d.name == key)
    }

    /// Generic name for a brand, matched case-insensitively.
    pub fn generic_for_brand(&self, brand: &str) -> Option<&str> {
        let brand = brand.trim();
        self.drug_aliases
            .iter()
            .find(|a| a.brand.eq_ignore_ascii_case(brand))
            .map(|a| a.generic.as_str())
    }

    pub fn is_generic(&self, name: &str) -> bool {
        let name = name.trim();
        self.generic_drugs.iter().any(|g| g.eq_ignore_ascii_case(name))
    }
}
