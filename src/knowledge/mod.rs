//! Immutable clinical tables shared by every pipeline component.
//!
//! Tables ship with the crate as JSON and can be replaced at startup by
//! pointing the engine at a directory holding `vocabulary.json`,
//! `terminology.json` and `evidence.json`.

pub mod evidence;
pub mod terminology;
pub mod vocabulary;

pub use evidence::*;
pub use terminology::*;
pub use vocabulary::*;

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const TERMINOLOGY_FILE: &str = "terminology.json";
pub const EVIDENCE_FILE: &str = "evidence.json";

const BUNDLED_VOCABULARY: &str = include_str!("../../resources/knowledge/vocabulary.json");
const BUNDLED_TERMINOLOGY: &str = include_str!("../../resources/knowledge/terminology.json");
const BUNDLED_EVIDENCE: &str = include_str!("../../resources/knowledge/evidence.json");

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge table {0}: {1}")]
    Read(String, String),

    #[error("Failed to parse knowledge table {0}: {1}")]
    Parse(String, String),

    #[error("Invalid value in {table}: {detail}")]
    InvalidValue { table: String, detail: String },
}

/// All tables consumed by the pipeline. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub vocabulary: Vocabulary,
    pub terminology: Terminology,
    pub evidence: Evidence,
}

impl KnowledgeBase {
    /// Tables compiled into the binary.
    pub fn bundled() -> Result<Self, KnowledgeError> {
        Self::from_json(BUNDLED_VOCABULARY, BUNDLED_TERMINOLOGY, BUNDLED_EVIDENCE)
    }

    /// Load all three tables from `dir`.
    pub fn load(dir: &Path) -> Result<Self, KnowledgeError> {
        let vocabulary = read_table(dir, VOCABULARY_FILE)?;
        let terminology = read_table(dir, TERMINOLOGY_FILE)?;
        let evidence = read_table(dir, EVIDENCE_FILE)?;
        Self::from_json(&vocabulary, &terminology, &evidence)
    }

    pub fn from_json(
        vocabulary: &str,
        terminology: &str,
        evidence: &str,
    ) -> Result<Self, KnowledgeError> {
        let kb = Self {
            vocabulary: parse_table(VOCABULARY_FILE, vocabulary)?,
            terminology: parse_table(TERMINOLOGY_FILE, terminology)?,
            evidence: parse_table(EVIDENCE_FILE, evidence)?,
        };
        kb.validate()?;
        tracing::debug!(
            symptoms = kb.terminology.symptoms.len(),
            diagnoses = kb.terminology.diagnoses.len(),
            priors = kb.evidence.priors.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Reject probabilities outside (0, 1) and non-positive ratios.
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        for (diagnosis, prior) in &self.evidence.priors {
            if !(*prior > 0.0 && *prior < 1.0) {
                return Err(invalid(format!("prior for '{diagnosis}' is {prior}")));
            }
        }
        for (symptom, ratios) in &self.evidence.likelihood_ratios {
            for (diagnosis, ratio) in ratios {
                if !(*ratio > 0.0 && ratio.is_finite()) {
                    return Err(invalid(format!(
                        "likelihood ratio {symptom} -> {diagnosis} is {ratio}"
                    )));
                }
            }
        }
        for adjustment in &self.evidence.context_adjustments {
            if !(adjustment.multiplier > 0.0 && adjustment.multiplier.is_finite()) {
                return Err(invalid(format!(
                    "multiplier for '{}' is {}",
                    adjustment.diagnosis, adjustment.multiplier
                )));
            }
        }
        if let Some(rule) = self
            .evidence
            .red_flag_rules
            .iter()
            .find(|r| r.patterns.is_empty())
        {
            return Err(invalid(format!(
                "red flag rule '{}' has no patterns",
                rule.category
            )));
        }
        Ok(())
    }

    /// ICD-10 code for a diagnosis name, if tabled.
    pub fn diagnosis_code(&self, name: &str) -> Option<&str> {
        self.terminology
            .diagnosis(name)
            .and_then(|d| d.code.as_deref())
    }
}

fn invalid(detail: String) -> KnowledgeError {
    KnowledgeError::InvalidValue {
        table: EVIDENCE_FILE.into(),
        detail,
    }
}

fn read_table(dir: &Path, file: &str) -> Result<String, KnowledgeError> {
    let path = dir.join(file);
    std::fs::read_to_string(&path)
        .map_err(|e| KnowledgeError::Read(path.display().to_string(), e.to_string()))
}

fn parse_table<T: DeserializeOwned>(file: &str, json: &str) -> Result<T, KnowledgeError> {
    serde_json::from_str(json).map_err(|e| KnowledgeError::Parse(file.into(), e.to_string()))
}

/// Shared bundled knowledge base for tests (no file I/O).
#[cfg(test)]
pub(crate) fn test_knowledge() -> std::sync::Arc<KnowledgeBase> {
    use std::sync::{Arc, LazyLock};

    static KB: LazyLock<Arc<KnowledgeBase>> =
        LazyLock::new(|| Arc::new(KnowledgeBase::bundled().expect("bundled tables are valid")));
    Arc::clone(&KB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvestigationKind, ProcedureKind, Severity};

    #[test]
    fn bundled_tables_parse_and_validate() {
        let kb = KnowledgeBase::bundled().unwrap();
        assert!(!kb.terminology.symptoms.is_empty());
        assert!(!kb.evidence.priors.is_empty());
        assert_eq!(
            kb.terminology.severity_tiers.first().map(|t| t.severity),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn every_likelihood_ratio_names_a_tabled_diagnosis() {
        let kb = test_knowledge();
        for (symptom, ratios) in &kb.evidence.likelihood_ratios {
            assert!(
                kb.terminology.symptoms.contains(symptom),
                "symptom '{symptom}' missing from vocabulary"
            );
            for diagnosis in ratios.keys() {
                assert!(
                    kb.terminology.diagnosis(diagnosis).is_some(),
                    "diagnosis '{diagnosis}' has no code entry"
                );
            }
        }
    }

    #[test]
    fn investigation_vocabularies_are_disjoint() {
        let kb = test_knowledge();
        let terms = kb.terminology.investigation_terms();
        let mut names: Vec<&str> = terms.iter().map(|(t, _)| *t).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), terms.len());
        assert!(terms.contains(&("cbc", InvestigationKind::Lab)));
        assert!(terms.contains(&("ecg", InvestigationKind::Procedure)));
    }

    #[test]
    fn diagnosis_code_lookup_is_case_insensitive() {
        let kb = test_knowledge();
        assert_eq!(kb.diagnosis_code("Acute Coronary Syndrome"), Some("I24.9"));
        assert_eq!(kb.diagnosis_code("unlisted condition"), None);
    }

    #[test]
    fn brand_resolves_to_generic() {
        let kb = test_knowledge();
        assert_eq!(kb.terminology.generic_for_brand("dolo"), Some("paracetamol"));
        assert!(kb.terminology.is_generic("Paracetamol"));
        assert!(!kb.terminology.is_generic("Dolo"));
    }

    #[test]
    fn procedure_kinds_deserialize() {
        let kb = test_knowledge();
        let appendectomy = kb
            .terminology
            .procedures
            .iter()
            .find(|p| p.name == "appendectomy")
            .unwrap();
        assert_eq!(appendectomy.kind, ProcedureKind::Surgical);
    }

    #[test]
    fn load_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VOCABULARY_FILE), BUNDLED_VOCABULARY).unwrap();
        std::fs::write(dir.path().join(TERMINOLOGY_FILE), BUNDLED_TERMINOLOGY).unwrap();
        std::fs::write(dir.path().join(EVIDENCE_FILE), BUNDLED_EVIDENCE).unwrap();

        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert_eq!(kb.evidence.prior("acute coronary syndrome"), Some(0.1));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KnowledgeBase::load(dir.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Read(_, _)));
    }

    #[test]
    fn load_reports_parse_error_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VOCABULARY_FILE), "{ not json").unwrap();
        std::fs::write(dir.path().join(TERMINOLOGY_FILE), BUNDLED_TERMINOLOGY).unwrap();
        std::fs::write(dir.path().join(EVIDENCE_FILE), BUNDLED_EVIDENCE).unwrap();

        match KnowledgeBase::load(dir.path()).unwrap_err() {
            KnowledgeError::Parse(file, _) => assert_eq!(file, VOCABULARY_FILE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_rejects_prior_of_one() {
        let mut kb = KnowledgeBase::default();
        kb.evidence.priors.insert("certainty".into(), 1.0);
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_ratio() {
        let mut kb = KnowledgeBase::default();
        kb.evidence
            .likelihood_ratios
            .entry("fever".into())
            .or_default()
            .insert("viral fever".into(), 0.0);
        assert!(kb.validate().is_err());
    }
}
