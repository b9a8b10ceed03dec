use std::sync::Arc;

use super::sections;
use crate::knowledge::KnowledgeBase;
use crate::models::Encounter;
use crate::pipeline::extraction::patterns::parse_duration;
use crate::pipeline::extraction::EntityRecognizer;
use crate::pipeline::normalize::VocabularyNormalizer;
use crate::pipeline::text::contains_term;

/// Turns one narration into a SOAP encounter record.
///
/// Structuring never fails: fields the note does not mention stay blank.
pub struct EncounterStructurer {
    normalizer: VocabularyNormalizer,
    recognizer: EntityRecognizer,
}

impl EncounterStructurer {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            normalizer: VocabularyNormalizer::new(kb.clone()),
            recognizer: EntityRecognizer::new(kb),
        }
    }

    pub fn structure(&self, raw_text: &str) -> Encounter {
        let _span = tracing::info_span!("structure_encounter", chars = raw_text.len()).entered();

        let mut encounter = Encounter::empty(raw_text);
        if raw_text.trim().is_empty() {
            return encounter;
        }
        let text = self.normalizer.expand(raw_text);

        let subjective = &mut encounter.subjective;
        subjective.chief_complaint = sections::chief_complaint(&text);
        let complaint = subjective.chief_complaint.to_lowercase();
        subjective.associated_symptoms = self
            .recognizer
            .mentioned_symptoms(&text)
            .into_iter()
            .filter(|s| !contains_term(&complaint, &s.to_lowercase()))
            .collect();
        subjective.duration = parse_duration(&subjective.chief_complaint)
            .or_else(|| parse_duration(&text))
            .unwrap_or_default();
        subjective.history = sections::history(&text);

        let objective = &mut encounter.objective;
        objective.vitals = self
            .recognizer
            .extract_vitals(&text)
            .into_iter()
            .map(|v| (v.name.clone(), v))
            .collect();
        objective.examination_findings = sections::examination_findings(&text);

        let diagnoses = self.recognizer.extract_diagnoses(&text);
        let assessment = &mut encounter.assessment;
        assessment.impression = sections::impression(&text, &diagnoses);
        let (primary, differentials): (Vec<_>, Vec<_>) =
            diagnoses.into_iter().partition(|d| d.is_primary);
        assessment.diagnoses = primary;
        assessment.differentials = differentials;

        let plan = &mut encounter.plan;
        plan.medications = self.recognizer.extract_drugs(&text);
        plan.investigations = self.recognizer.extract_investigations(&text);
        plan.procedures = self.recognizer.extract_procedures(&text);
        plan.advice = sections::advice(&text);
        plan.follow_up = sections::follow_up(&text);
        plan.referrals = sections::referrals(&text);

        tracing::debug!(
            vitals = encounter.objective.vitals.len(),
            diagnoses = encounter.assessment.diagnoses.len(),
            differentials = encounter.assessment.differentials.len(),
            medications = encounter.plan.medications.len(),
            investigations = encounter.plan.investigations.len(),
            "Structured encounter"
        );
        encounter
    }
}
