use std::sync::Arc;

use super::reasoning::DiagnosticReasoner;
use crate::models::Encounter;

/// Natural-language summary of a structured encounter.
pub struct NarrativeSummarizer {
    reasoner: Arc<DiagnosticReasoner>,
}

impl NarrativeSummarizer {
    pub fn new(reasoner: Arc<DiagnosticReasoner>) -> Self {
        Self { reasoner }
    }

    pub fn summarize(&self, encounter: &Encounter) -> String {
        self.reasoner.generate_clinical_summary(encounter)
    }
}
