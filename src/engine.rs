//! Long-lived service object exposing every pipeline operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::AppError;
use crate::knowledge::KnowledgeBase;
use crate::models::{
    ClinicalContext, Diagnosis, Differential, Drug, Encounter, Investigation, Procedure, RedFlag,
    Symptom, VitalSign,
};
use crate::pipeline::extraction::EntityRecognizer;
use crate::pipeline::llm::{NoopGenerator, OllamaClient, TextGenerator};
use crate::pipeline::normalize::VocabularyNormalizer;
use crate::pipeline::reasoning::DiagnosticReasoner;
use crate::pipeline::structuring::EncounterStructurer;
use crate::pipeline::summarizer::NarrativeSummarizer;

/// Everything the pipeline derives from one narration.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub encounter: Encounter,
    pub symptoms: Vec<Symptom>,
    pub differentials: Vec<Differential>,
    pub suggested_investigations: Vec<Investigation>,
    pub red_flags: Vec<RedFlag>,
    pub summary: String,
}

/// Read-only; share one instance across threads.
pub struct ClinicalEngine {
    kb: Arc<KnowledgeBase>,
    normalizer: VocabularyNormalizer,
    recognizer: EntityRecognizer,
    structurer: EncounterStructurer,
    reasoner: Arc<DiagnosticReasoner>,
    summarizer: NarrativeSummarizer,
}

impl ClinicalEngine {
    pub fn new(kb: Arc<KnowledgeBase>, generator: Arc<dyn TextGenerator>) -> Self {
        let reasoner = Arc::new(DiagnosticReasoner::with_generator(kb.clone(), generator));
        Self {
            normalizer: VocabularyNormalizer::new(kb.clone()),
            recognizer: EntityRecognizer::new(kb.clone()),
            structurer: EncounterStructurer::new(kb.clone()),
            summarizer: NarrativeSummarizer::new(reasoner.clone()),
            reasoner,
            kb,
        }
    }

    /// Engine without a text generator.
    pub fn rule_based(kb: Arc<KnowledgeBase>) -> Self {
        Self::new(kb, Arc::new(NoopGenerator))
    }

    /// Knowledge tables from the configured directory (bundled when unset)
    /// and an Ollama collaborator when enabled.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AppError> {
        let kb = match &config.knowledge_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "Loading knowledge tables");
                KnowledgeBase::load(dir)?
            }
            None => KnowledgeBase::bundled()?,
        };

        let generator: Arc<dyn TextGenerator> = if config.llm.enabled {
            tracing::info!(
                url = %config.llm.base_url,
                model = %config.llm.model,
                "Text generation enabled"
            );
            Arc::new(
                OllamaClient::new(&config.llm.base_url, &config.llm.model, config.llm.timeout_secs)?
                    .with_max_tokens(config.llm.max_tokens),
            )
        } else {
            Arc::new(NoopGenerator)
        };

        Ok(Self::new(Arc::new(kb), generator))
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.expand(text)
    }

    pub fn resolve_ambiguous(&self, term: &str, context: &str) -> String {
        self.normalizer.resolve_ambiguous(term, context)
    }

    pub fn extract_symptoms(&self, text: &str) -> Vec<Symptom> {
        self.recognizer.extract_symptoms(&self.normalize(text))
    }

    pub fn extract_diagnoses(&self, text: &str) -> Vec<Diagnosis> {
        self.recognizer.extract_diagnoses(&self.normalize(text))
    }

    pub fn extract_drugs(&self, text: &str) -> Vec<Drug> {
        self.recognizer.extract_drugs(&self.normalize(text))
    }

    pub fn extract_investigations(&self, text: &str) -> Vec<Investigation> {
        self.recognizer.extract_investigations(&self.normalize(text))
    }

    pub fn extract_procedures(&self, text: &str) -> Vec<Procedure> {
        self.recognizer.extract_procedures(&self.normalize(text))
    }

    pub fn extract_vitals(&self, text: &str) -> Vec<VitalSign> {
        self.recognizer.extract_vitals(&self.normalize(text))
    }

    pub fn structure_encounter(&self, text: &str) -> Encounter {
        self.structurer.structure(text)
    }

    pub fn generate_ranked_differentials(
        &self,
        symptoms: &[Symptom],
        context: Option<&ClinicalContext>,
    ) -> Vec<Differential> {
        self.reasoner.generate_ranked_differentials(symptoms, context)
    }

    pub fn suggest_investigations(&self, differentials: &[Differential]) -> Vec<Investigation> {
        self.reasoner.suggest_investigations(differentials)
    }

    pub fn flag_red_flags(
        &self,
        symptoms: &[Symptom],
        vitals: &BTreeMap<String, String>,
        history: &str,
    ) -> Vec<RedFlag> {
        self.reasoner.flag_red_flags(symptoms, vitals, history)
    }

    pub fn generate_clinical_summary(&self, encounter: &Encounter) -> String {
        self.summarizer.summarize(encounter)
    }

    /// Structure the note, then reason over its symptoms. Charted vitals
    /// take precedence over the context's recent vitals.
    pub fn analyze(&self, text: &str, context: Option<&ClinicalContext>) -> Analysis {
        let normalized = self.normalize(text);
        let encounter = self.structurer.structure(text);
        let symptoms = self.recognizer.extract_symptoms(&normalized);

        let differentials = self.generate_ranked_differentials(&symptoms, context);
        let suggested_investigations = self.suggest_investigations(&differentials);

        let mut vitals = context
            .map(|c| c.recent_vitals.clone())
            .unwrap_or_default();
        vitals.extend(encounter.objective.vital_readings());
        let red_flags = self.flag_red_flags(&symptoms, &vitals, &normalized);

        let summary = self.generate_clinical_summary(&encounter);

        Analysis {
            encounter,
            symptoms,
            differentials,
            suggested_investigations,
            red_flags,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::knowledge::test_knowledge;
    use crate::models::Urgency;
    use crate::pipeline::llm::MockTextGenerator;

    fn engine() -> ClinicalEngine {
        ClinicalEngine::rule_based(test_knowledge())
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClinicalEngine>();
    }

    #[test]
    fn extraction_normalizes_first() {
        let symptoms = engine().extract_symptoms("pt c/o bukhar x 3 din");
        assert_eq!(symptoms.len(), 1);
        assert_eq!(symptoms[0].name, "fever");
        assert_eq!(symptoms[0].duration.as_deref(), Some("3 days"));

        let dx = engine().extract_diagnoses("k/c/o HTN");
        assert_eq!(dx[0].name, "hypertension");
    }

    #[test]
    fn unit_shorthand_keeps_its_meaning() {
        let e = engine();
        assert_eq!(e.normalize("chest pain since 2 hr"), "chest pain since 2 hours");
        let symptoms = e.extract_symptoms("chest pain since 2 hr");
        assert_eq!(symptoms[0].duration.as_deref(), Some("2 hours"));

        assert!(e.extract_vitals("bukhar of 10 din").is_empty());
    }

    #[test]
    fn chest_pain_analysis() {
        let context = ClinicalContext {
            age: Some(58),
            known_conditions: vec!["diabetes mellitus".into()],
            ..Default::default()
        };
        let analysis = engine().analyze(
            "Pt c/o severe chest pain radiating to left arm since 1 hour with sweating. \
             BP 200/120, SpO2 85%.",
            Some(&context),
        );

        assert_eq!(analysis.differentials[0].diagnosis, "acute coronary syndrome");
        assert_eq!(analysis.differentials[0].urgency, Urgency::Stat);
        assert!(analysis.suggested_investigations.iter().any(|i| i.name == "ECG"));

        let categories: Vec<&str> = analysis.red_flags.iter().map(|f| f.category.as_str()).collect();
        assert!(categories.contains(&"acute coronary syndrome"));
        assert!(categories.contains(&"hypertensive crisis"));
        assert!(categories.contains(&"hypoxia"));
        assert!(analysis.summary.starts_with("Patient presents with severe chest pain"));
    }

    #[test]
    fn context_vitals_are_screened() {
        let context = ClinicalContext {
            recent_vitals: [("SpO2".to_string(), "86%".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let analysis = engine().analyze("cough since 2 days", Some(&context));
        assert!(analysis.red_flags.iter().any(|f| f.category == "hypoxia"));
    }

    #[test]
    fn empty_narration_is_not_an_error() {
        let analysis = engine().analyze("", None);
        assert!(analysis.differentials.is_empty());
        assert!(analysis.suggested_investigations.is_empty());
        assert!(analysis.red_flags.is_empty());
        assert!(analysis.summary.is_empty());
    }

    #[test]
    fn failing_generator_does_not_change_results() {
        let text = "c/o fever and cough since 3 days";
        let plain = engine().analyze(text, None);
        let with_failure =
            ClinicalEngine::new(test_knowledge(), Arc::new(MockTextGenerator::failing())).analyze(text, None);
        assert_eq!(plain.differentials, with_failure.differentials);
        assert_eq!(plain.summary, with_failure.summary);
    }

    #[test]
    fn concurrent_calls_share_one_engine() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.analyze("c/o headache and vomiting", None).differentials)
            })
            .collect();
        let results: Vec<Vec<Differential>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert!(!results[0].is_empty());
    }

    #[test]
    fn from_config_uses_bundled_tables() {
        let engine = ClinicalEngine::from_config(&EngineConfig::default()).unwrap();
        assert!(!engine.knowledge().terminology.symptoms.is_empty());
    }

    #[test]
    fn from_config_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default().with_knowledge_dir(&dir.path().join("missing"));
        assert!(matches!(
            ClinicalEngine::from_config(&config),
            Err(AppError::Knowledge(_))
        ));
    }
}
