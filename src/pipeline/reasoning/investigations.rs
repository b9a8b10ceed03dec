use super::DiagnosticReasoner;
use crate::models::{Differential, Investigation, InvestigationKind, Urgency};

const IMAGING_KEYWORDS: &[&str] = &[
    "x-ray", "xray", "ct", "mri", "ultrasound", "usg", "echo", "doppler", "scan", "mammogram",
];
const PROCEDURE_KEYWORDS: &[&str] = &[
    "ecg", "ekg", "endoscopy", "colonoscopy", "lumbar puncture", "biopsy", "spirometry", "tmt",
    "angiography", "eeg",
];

impl DiagnosticReasoner {
    /// Recommended investigations of every differential, first mention
    /// wins. Urgency follows the parent differential.
    pub fn suggest_investigations(&self, differentials: &[Differential]) -> Vec<Investigation> {
        let mut suggestions: Vec<Investigation> = Vec::new();

        for differential in differentials {
            let urgency = match differential.urgency {
                Urgency::Stat if differential.probability > 0.8 => Urgency::Stat,
                Urgency::Stat => Urgency::Urgent,
                _ if differential.probability > 0.7 => Urgency::Urgent,
                _ => Urgency::Routine,
            };

            for name in &differential.recommended_investigations {
                if suggestions.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
                    continue;
                }
                suggestions.push(Investigation {
                    name: name.clone(),
                    kind: kind_for_name(name),
                    urgency,
                    reason: Some(format!("rule out {}", differential.diagnosis)),
                    timing: None,
                    context: String::new(),
                });
            }
        }

        tracing::debug!(count = suggestions.len(), "Suggested investigations");
        suggestions
    }
}

/// Investigation kind from keywords in the test name; lab by default.
pub fn kind_for_name(name: &str) -> InvestigationKind {
    let lower = name.to_lowercase();
    let has_word = |keyword: &&str| {
        lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .any(|w| w == *keyword)
            || (keyword.contains([' ', '-']) && lower.contains(*keyword))
    };

    if IMAGING_KEYWORDS.iter().any(has_word) {
        InvestigationKind::Imaging
    } else if PROCEDURE_KEYWORDS.iter().any(has_word) {
        InvestigationKind::Procedure
    } else {
        InvestigationKind::Lab
    }
}
