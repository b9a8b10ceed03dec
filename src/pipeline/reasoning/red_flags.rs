use std::collections::BTreeMap;

use super::DiagnosticReasoner;
use crate::models::{RedFlag, Severity, Symptom};

const BLOOD_PRESSURE_KEYS: &[&str] = &["bp", "blood pressure"];
const OXYGEN_SATURATION_KEYS: &[&str] = &["spo2", "oxygen saturation", "o2 sat", "saturation"];

const CRISIS_SYSTOLIC: f64 = 180.0;
const CRISIS_DIASTOLIC: f64 = 110.0;
const HYPOTENSION_SYSTOLIC: f64 = 90.0;
const HYPOXIA_SPO2: f64 = 90.0;

impl DiagnosticReasoner {
    /// Red flags from symptom names, free-text history and vital readings.
    /// Descriptions are unique; the first flag with a description wins.
    pub fn flag_red_flags(
        &self,
        symptoms: &[Symptom],
        vitals: &BTreeMap<String, String>,
        history: &str,
    ) -> Vec<RedFlag> {
        let history = history.to_lowercase();
        let names: Vec<String> = symptoms.iter().map(|s| s.name.to_lowercase()).collect();

        let mut flags: Vec<RedFlag> = Vec::new();
        for rule in &self.kb.evidence.red_flag_rules {
            let matched = rule.patterns.iter().any(|pattern| {
                let pattern = pattern.to_lowercase();
                names.iter().any(|n| n.contains(&pattern)) || history.contains(&pattern)
            });
            if matched {
                flags.push(RedFlag {
                    category: rule.category.clone(),
                    description: rule.description.clone(),
                    severity: rule.severity,
                    action: rule.action.clone(),
                    time_critical: true,
                    body_system: rule.body_system.clone(),
                });
            }
        }
        flags.extend(vital_red_flags(vitals));

        let mut unique: Vec<RedFlag> = Vec::with_capacity(flags.len());
        for flag in flags {
            if !unique.iter().any(|u| u.description == flag.description) {
                unique.push(flag);
            }
        }

        tracing::debug!(count = unique.len(), "Flagged red flags");
        unique
    }
}

/// Threshold checks on blood pressure and oxygen saturation. Readings that
/// do not parse are skipped.
fn vital_red_flags(vitals: &BTreeMap<String, String>) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    if let Some((systolic, diastolic)) = reading(vitals, BLOOD_PRESSURE_KEYS).and_then(parse_pressure) {
        if systolic >= CRISIS_SYSTOLIC || diastolic >= CRISIS_DIASTOLIC {
            flags.push(RedFlag {
                category: "hypertensive crisis".into(),
                description: format!("Blood pressure {systolic}/{diastolic} mmHg is in the hypertensive crisis range"),
                severity: Severity::Critical,
                action: "Repeat reading, assess for end-organ damage and start controlled blood pressure reduction".into(),
                time_critical: true,
                body_system: "cardiovascular".into(),
            });
        } else if systolic < HYPOTENSION_SYSTOLIC {
            flags.push(RedFlag {
                category: "hypotension".into(),
                description: format!("Systolic blood pressure {systolic} mmHg is below 90"),
                severity: Severity::Severe,
                action: "Assess perfusion, secure IV access and start fluid resuscitation".into(),
                time_critical: true,
                body_system: "cardiovascular".into(),
            });
        }
    }

    if let Some(spo2) = reading(vitals, OXYGEN_SATURATION_KEYS).and_then(leading_number) {
        if spo2 < HYPOXIA_SPO2 {
            flags.push(RedFlag {
                category: "hypoxia".into(),
                description: format!("Oxygen saturation {spo2}% is below 90%"),
                severity: Severity::Critical,
                action: "Start supplemental oxygen and assess airway and breathing".into(),
                time_critical: true,
                body_system: "respiratory".into(),
            });
        }
    }

    flags
}

/// Value under any of `keys`, matching case-insensitively with `_` as a space.
fn reading<'a>(vitals: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    vitals.iter().find_map(|(key, value)| {
        let key = key.to_lowercase().replace('_', " ");
        keys.contains(&key.trim()).then_some(value.as_str())
    })
}

/// "200/120", "200/120 mmHg" → (200, 120).
fn parse_pressure(value: &str) -> Option<(f64, f64)> {
    let (systolic, diastolic) = value.split_once('/')?;
    Some((leading_number(systolic)?, leading_number(diastolic)?))
}

/// Number at the start of a reading, ignoring units such as "%" or "mmHg".
fn leading_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::test_knowledge;

    fn reasoner() -> DiagnosticReasoner {
        DiagnosticReasoner::new(test_knowledge())
    }

    fn vitals(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn hypertensive_crisis_is_critical() {
        let flags = reasoner().flag_red_flags(&[], &vitals(&[("BP", "200/120")]), "");
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].category, "hypertensive crisis");
        assert_eq!(flags[0].severity, Severity::Critical);
        assert!(flags[0].description.contains("200/120"));
    }

    #[test]
    fn diastolic_alone_triggers_crisis() {
        let flags = reasoner().flag_red_flags(&[], &vitals(&[("blood_pressure", "150/112 mmHg")]), "");
        assert_eq!(flags[0].category, "hypertensive crisis");
    }

    #[test]
    fn low_systolic_is_hypotension() {
        let flags = reasoner().flag_red_flags(&[], &vitals(&[("bp", "80/50")]), "");
        assert_eq!(flags[0].category, "hypotension");
        assert_eq!(flags[0].severity, Severity::Severe);
    }

    #[test]
    fn low_saturation_is_hypoxia() {
        let flags = reasoner().flag_red_flags(&[], &vitals(&[("SpO2", "85%")]), "");
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].category, "hypoxia");
        assert_eq!(flags[0].severity, Severity::Critical);
    }

    #[test]
    fn normal_and_malformed_vitals_are_quiet() {
        let normal = vitals(&[("BP", "120/80"), ("SpO2", "98")]);
        assert!(reasoner().flag_red_flags(&[], &normal, "").is_empty());

        let malformed = vitals(&[("BP", "high"), ("SpO2", "unknown"), ("BP2", "250/150")]);
        assert!(reasoner().flag_red_flags(&[], &malformed, "").is_empty());
    }

    #[test]
    fn symptom_pattern_is_time_critical() {
        let flags = reasoner().flag_red_flags(
            &[Symptom::named("Chest pain")],
            &BTreeMap::new(),
            "",
        );
        let acs = flags
            .iter()
            .find(|f| f.category == "acute coronary syndrome")
            .unwrap();
        assert!(acs.time_critical);
        assert_eq!(acs.severity, Severity::Critical);
    }

    #[test]
    fn history_text_is_searched() {
        let flags = reasoner().flag_red_flags(
            &[],
            &BTreeMap::new(),
            "Sudden onset, WORST HEADACHE OF LIFE since morning",
        );
        assert!(flags.iter().any(|f| f.category == "subarachnoid hemorrhage"));
    }

    #[test]
    fn descriptions_are_unique() {
        let symptoms = [
            Symptom::named("chest pain"),
            Symptom::named("chest pain"),
            Symptom::named("chest tightness"),
        ];
        let flags = reasoner().flag_red_flags(
            &symptoms,
            &vitals(&[("BP", "210/130"), ("spo2", "82")]),
            "crushing chest pain radiating to left arm",
        );
        let mut descriptions: Vec<&str> = flags.iter().map(|f| f.description.as_str()).collect();
        let before = descriptions.len();
        descriptions.sort_unstable();
        descriptions.dedup();
        assert_eq!(descriptions.len(), before);
        assert!(flags.iter().any(|f| f.category == "hypoxia"));
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(reasoner().flag_red_flags(&[], &BTreeMap::new(), "").is_empty());
    }
}
