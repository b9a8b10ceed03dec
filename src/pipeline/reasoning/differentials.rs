use super::{prompt, DiagnosticReasoner};
use crate::models::{ClinicalContext, Differential, Severity, Symptom, Urgency};

/// Prior for diagnoses missing from the prevalence table.
pub const PRIOR_FLOOR: f64 = 0.001;
pub const MAX_PROBABILITY: f64 = 0.95;
pub const MAX_DIFFERENTIALS: usize = 10;
/// Above this a non-critical differential is urgent.
const URGENT_PROBABILITY: f64 = 0.5;

/// Accumulated evidence for one diagnosis.
struct Candidate<'a> {
    diagnosis: &'a str,
    ratio: f64,
    features: Vec<String>,
    critical: bool,
}

/// Posterior from a prior and a combined likelihood ratio, via odds.
pub fn posterior_probability(prior: f64, likelihood_ratio: f64) -> f64 {
    if prior >= 1.0 {
        return 1.0;
    }
    let posterior_odds = prior / (1.0 - prior) * likelihood_ratio;
    posterior_odds / (1.0 + posterior_odds)
}

impl DiagnosticReasoner {
    /// Ranked candidates for the given symptoms, at most ten, highest
    /// probability first. The text generator, when available, may reorder
    /// the list; on any failure the rule-based order stands.
    pub fn generate_ranked_differentials(
        &self,
        symptoms: &[Symptom],
        context: Option<&ClinicalContext>,
    ) -> Vec<Differential> {
        let _span = tracing::info_span!("rank_differentials", symptoms = symptoms.len()).entered();
        let ranked = self.rule_based_differentials(symptoms, context);
        self.refine_ranking(ranked)
    }

    /// The deterministic ranking, without the text generator.
    pub fn rule_based_differentials(
        &self,
        symptoms: &[Symptom],
        context: Option<&ClinicalContext>,
    ) -> Vec<Differential> {
        let evidence = &self.kb.evidence;
        let mut candidates: Vec<Candidate> = Vec::new();

        for symptom in symptoms {
            let Some(ratios) = evidence.likelihood_ratios.get(&symptom.name.to_lowercase()) else {
                continue;
            };
            let critical = symptom.severity == Some(Severity::Critical);

            for (diagnosis, ratio) in ratios {
                match candidates.iter_mut().find(|c| c.diagnosis == diagnosis) {
                    Some(candidate) => {
                        // Repeated mentions compound: conditional independence is assumed.
                        candidate.ratio *= ratio;
                        if !candidate.features.contains(&symptom.name) {
                            candidate.features.push(symptom.name.clone());
                        }
                        candidate.critical |= critical;
                    }
                    None => candidates.push(Candidate {
                        diagnosis,
                        ratio: *ratio,
                        features: vec![symptom.name.clone()],
                        critical,
                    }),
                }
            }
        }

        let mut differentials: Vec<Differential> = candidates
            .into_iter()
            .map(|c| self.differential(c, context))
            .collect();

        // Stable: ties keep first-seen order.
        differentials.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        differentials.truncate(MAX_DIFFERENTIALS);

        tracing::debug!(count = differentials.len(), "Ranked differentials");
        differentials
    }

    fn differential(&self, candidate: Candidate, context: Option<&ClinicalContext>) -> Differential {
        let evidence = &self.kb.evidence;
        let diagnosis = candidate.diagnosis;
        let prior = evidence.prior(diagnosis).unwrap_or(PRIOR_FLOOR);

        let mut probability = posterior_probability(prior, candidate.ratio);
        if let Some(context) = context {
            for adjustment in evidence.adjustments_for(diagnosis) {
                if adjustment.factor.applies(context) {
                    probability *= adjustment.multiplier;
                }
            }
        }
        let probability = probability.clamp(0.0, MAX_PROBABILITY);

        let urgency = if evidence.is_life_threatening(diagnosis) || candidate.critical {
            Urgency::Stat
        } else if probability > URGENT_PROBABILITY {
            Urgency::Urgent
        } else {
            Urgency::Routine
        };

        Differential {
            diagnosis: diagnosis.to_string(),
            code: self.kb.diagnosis_code(diagnosis).map(str::to_string),
            probability,
            prior,
            supporting_features: candidate.features,
            recommended_investigations: evidence.protocol(diagnosis).to_vec(),
            red_flags: evidence.red_flags_for(diagnosis).to_vec(),
            urgency,
        }
    }

    fn refine_ranking(&self, ranked: Vec<Differential>) -> Vec<Differential> {
        if ranked.len() < 2 || !self.generator.is_available() {
            return ranked;
        }

        let response = match self.generator.generate(&prompt::ranking_request(&ranked)) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Ranking refinement failed, keeping rule-based order");
                return ranked;
            }
        };

        match prompt::parse_ranking(&response) {
            Some(order) => reorder(ranked, &order),
            None => {
                tracing::warn!("Ranking refinement returned no usable list, keeping rule-based order");
                ranked
            }
        }
    }
}

/// Moves named differentials to the front in the given order. Unknown names
/// are ignored; unnamed differentials keep their relative order.
fn reorder(mut remaining: Vec<Differential>, order: &[String]) -> Vec<Differential> {
    let mut reordered = Vec::with_capacity(remaining.len());
    for name in order {
        if let Some(pos) = remaining
            .iter()
            .position(|d| d.diagnosis.eq_ignore_ascii_case(name))
        {
            reordered.push(remaining.remove(pos));
        }
    }
    reordered.extend(remaining);
    reordered
}
