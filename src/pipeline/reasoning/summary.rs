use super::{prompt, DiagnosticReasoner};
use crate::models::Encounter;

impl DiagnosticReasoner {
    /// A short paragraph describing the encounter. The text generator may
    /// rephrase it; the assembled text is returned whenever it cannot.
    pub fn generate_clinical_summary(&self, encounter: &Encounter) -> String {
        let summary = assemble_summary(encounter);
        if summary.is_empty() || !self.generator.is_available() {
            return summary;
        }

        match self.generator.generate(&prompt::summary_request(&summary)) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Summary rephrasing returned empty text, using assembled summary");
                summary
            }
            Err(e) => {
                tracing::warn!(error = %e, "Summary rephrasing failed, using assembled summary");
                summary
            }
        }
    }
}

/// Deterministic summary: complaint, duration, up to three associated
/// symptoms, vitals, up to two findings, primary diagnosis and plan.
pub fn assemble_summary(encounter: &Encounter) -> String {
    let subjective = &encounter.subjective;
    let mut sentences: Vec<String> = Vec::new();

    if !subjective.chief_complaint.is_empty() {
        let mut sentence = format!("Patient presents with {}", subjective.chief_complaint);
        if !subjective.duration.is_empty() && !subjective.chief_complaint.contains(&subjective.duration) {
            sentence.push_str(&format!(" for {}", subjective.duration));
        }
        sentences.push(sentence);
    }

    if !subjective.associated_symptoms.is_empty() {
        let symptoms: Vec<&str> = subjective
            .associated_symptoms
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        sentences.push(format!("Associated symptoms: {}", symptoms.join(", ")));
    }

    if !encounter.objective.vitals.is_empty() {
        let vitals: Vec<String> = encounter
            .objective
            .vitals
            .iter()
            .map(|(key, vital)| format!("{key} {}", vital.display().trim()))
            .collect();
        sentences.push(format!("Vitals: {}", vitals.join(", ")));
    }

    if !encounter.objective.examination_findings.is_empty() {
        let findings: Vec<&str> = encounter
            .objective
            .examination_findings
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        sentences.push(format!("Examination: {}", findings.join("; ")));
    }

    if let Some(primary) = encounter.assessment.primary_diagnosis() {
        sentences.push(format!("Primary diagnosis: {}", primary.name));
    }

    let plan = &encounter.plan;
    let mut highlights: Vec<String> = Vec::new();
    if !plan.medications.is_empty() {
        let names: Vec<&str> = plan.medications.iter().map(|m| m.name.as_str()).collect();
        highlights.push(format!("medications {}", names.join(", ")));
    }
    if !plan.investigations.is_empty() {
        let names: Vec<&str> = plan.investigations.iter().map(|i| i.name.as_str()).collect();
        highlights.push(format!("investigations {}", names.join(", ")));
    }
    if !plan.referrals.is_empty() {
        highlights.push(format!("referral to {}", plan.referrals.join(", ")));
    }
    if !plan.follow_up.is_empty() {
        highlights.push(format!("follow-up in {}", plan.follow_up));
    }
    if !highlights.is_empty() {
        sentences.push(format!("Plan: {}", highlights.join("; ")));
    }

    if sentences.is_empty() {
        return String::new();
    }
    let mut summary = sentences.join(". ");
    summary.push('.');
    summary
}
