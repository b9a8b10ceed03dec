use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::patterns::canonical_unit;
use super::EntityRecognizer;
use crate::models::{VitalSign, VitalType};
use crate::pipeline::text::{clean_phrase, find_term, window, window_bounds};

const CELSIUS_MIN: f64 = 30.0;
const CELSIUS_MAX: f64 = 45.0;
const FAHRENHEIT_MIN: f64 = 86.0;
const FAHRENHEIT_MAX: f64 = 113.0;

/// Bytes around a glucose reading searched for fasting / post-meal words.
const GLUCOSE_WINDOW: usize = 40;

const FASTING_WORDS: &[&str] = &["fasting", "empty stomach", "khali pet", "fbs"];
const POST_MEAL_WORDS: &[&str] = &[
    "postprandial", "post prandial", "post-prandial", "after food", "after meal", "after meals",
    "after breakfast", "after lunch", "ppbs", "pp",
];

macro_rules! vital_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect(concat!("valid ", stringify!($name), " regex")));
    };
}

vital_regex!(
    BLOOD_PRESSURE,
    r"(?i)\b(?:bp|blood\s+pressure)\s*(?:[:=\-]|of|is|was)?\s*(\d{2,3})\s*/\s*(\d{2,3})"
);
vital_regex!(
    PULSE,
    r"(?i)\b(?:pulse(?:\s+rate)?|pr|hr|heart\s+rate)\s*(?:[:=\-]|of|is|was)?\s*(\d{2,3})\b"
);
vital_regex!(
    TEMPERATURE,
    r"(?i)\b(?:temp(?:erature)?|fever\s+(?:of|upto|up\s+to|till))\s*(?:[:=\-]|of|is|was)?\s*(\d{2,3}(?:\.\d+)?)"
);
vital_regex!(
    OXYGEN_SATURATION,
    r"(?i)\b(?:spo2|sp02|o2\s*sat(?:uration)?|oxygen\s+saturation|saturation|sats?)\s*(?:[:=\-]|of|is|was|at)?\s*(\d{2,3})\s*%?"
);
vital_regex!(
    RESPIRATORY_RATE,
    r"(?i)\b(?:rr|resp(?:iratory)?\s*rate)\s*(?:[:=\-]|of|is|was)?\s*(\d{1,2})\b"
);
vital_regex!(
    WEIGHT,
    r"(?i)\b(?:weight|wt)\s*(?:[:=\-]|of|is|was)?\s*(\d{1,3}(?:\.\d+)?)\s*(?:kgs?)?\b"
);
vital_regex!(
    HEIGHT,
    r"(?i)\b(?:height|ht)\s*(?:[:=\-]|of|is|was)?\s*(\d{1,3}(?:\.\d+)?)\s*(?:cm|m)?\b"
);
vital_regex!(
    BODY_MASS_INDEX,
    r"(?i)\bbmi\s*(?:[:=\-]|of|is|was)?\s*(\d{2}(?:\.\d+)?)"
);
vital_regex!(
    GLUCOSE,
    r"(?i)\b(fbs|ppbs|rbs|grbs|cbg|blood\s+sugar|blood\s+glucose|sugar|glucose)\s*(?:levels?)?\s*(?:[:=\-]|of|is|was)?\s*(\d{2,3})\b"
);

impl EntityRecognizer {
    /// Vital measurements, one per vital type, in order of appearance.
    /// BMI is derived from weight and height when not charted.
    pub fn extract_vitals(&self, text: &str) -> Vec<VitalSign> {
        extract_vitals(text)
    }
}

pub fn extract_vitals(text: &str) -> Vec<VitalSign> {
    let mut found: Vec<(usize, VitalSign)> = Vec::new();

    if let Some(c) = BLOOD_PRESSURE.captures(text) {
        if let (Some(sys), Some(dia)) = (number(&c, 1), number(&c, 2)) {
            push(&mut found, &c, text, VitalSign::new(VitalType::BloodPressure, sys, Some(dia), ""));
        }
    }
    single(&mut found, text, &PULSE, VitalType::Pulse, |v| v);
    if let Some((c, celsius)) = TEMPERATURE.captures_iter(text).find_map(|c| {
        let reading = c.get(1)?;
        if is_duration(&text[reading.end()..]) {
            return None;
        }
        let celsius = to_celsius(reading.as_str().parse().ok()?)?;
        Some((c, celsius))
    }) {
        push(&mut found, &c, text, VitalSign::new(VitalType::Temperature, celsius, None, ""));
    }
    if let Some(c) = OXYGEN_SATURATION
        .captures_iter(text)
        .find(|c| number(c, 1).is_some_and(|v| v <= 100.0))
    {
        if let Some(v) = number(&c, 1) {
            push(&mut found, &c, text, VitalSign::new(VitalType::OxygenSaturation, v, None, ""));
        }
    }
    single(&mut found, text, &RESPIRATORY_RATE, VitalType::RespiratoryRate, |v| v);
    single(&mut found, text, &WEIGHT, VitalType::Weight, |v| v);
    single(&mut found, text, &HEIGHT, VitalType::Height, |v| if v < 3.0 { v * 100.0 } else { v });
    single(&mut found, text, &BODY_MASS_INDEX, VitalType::BodyMassIndex, |v| v);

    for c in GLUCOSE.captures_iter(text) {
        let (Some(keyword), Some(value)) = (c.get(1), number(&c, 2)) else {
            continue;
        };
        let Some(whole) = c.get(0) else {
            continue;
        };
        let vital_type = glucose_type(text, keyword.as_str(), whole.start(), whole.end());
        if found.iter().any(|(_, v)| v.vital_type == vital_type) {
            continue;
        }
        push(&mut found, &c, text, VitalSign::new(vital_type, value, None, ""));
    }

    found.sort_by_key(|(pos, _)| *pos);
    let mut vitals: Vec<VitalSign> = found.into_iter().map(|(_, v)| v).collect();

    if !vitals.iter().any(|v| v.vital_type == VitalType::BodyMassIndex) {
        if let Some(bmi) = derived_bmi(&vitals) {
            vitals.push(bmi);
        }
    }

    tracing::debug!(count = vitals.len(), "Extracted vitals");
    vitals
}

fn single(
    found: &mut Vec<(usize, VitalSign)>,
    text: &str,
    re: &Regex,
    vital_type: VitalType,
    convert: impl Fn(f64) -> f64,
) {
    if let Some(c) = re.captures(text) {
        if let Some(v) = number(&c, 1) {
            push(found, &c, text, VitalSign::new(vital_type, convert(v), None, ""));
        }
    }
}

fn push(found: &mut Vec<(usize, VitalSign)>, caps: &Captures, text: &str, mut vital: VitalSign) {
    if let Some(m) = caps.get(0) {
        vital.context = clean_phrase(window(text, m.start(), m.end(), 20));
        found.push((m.start(), vital));
    }
}

fn number(caps: &Captures, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse().ok()
}

/// Celsius for a plausible body temperature in either scale.
fn to_celsius(v: f64) -> Option<f64> {
    if (CELSIUS_MIN..=CELSIUS_MAX).contains(&v) {
        Some(v)
    } else if (FAHRENHEIT_MIN..=FAHRENHEIT_MAX).contains(&v) {
        Some(round1((v - 32.0) * 5.0 / 9.0))
    } else {
        None
    }
}

/// "10 days" after "fever of" is how long, not how hot.
fn is_duration(rest: &str) -> bool {
    let word: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect();
    !word.is_empty() && canonical_unit(&word).is_some()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Sub-type from the matched keyword, else the nearest fasting / post-meal
/// word around the reading, else random.
fn glucose_type(text: &str, keyword: &str, start: usize, end: usize) -> VitalType {
    match keyword.to_lowercase().as_str() {
        "fbs" => return VitalType::FastingGlucose,
        "ppbs" => return VitalType::PostprandialGlucose,
        "rbs" | "grbs" | "cbg" => return VitalType::RandomGlucose,
        _ => {}
    }

    let (ws, we) = window_bounds(text, start, end, GLUCOSE_WINDOW);
    let lower = text[ws..we].to_lowercase();
    let (rs, re) = (start - ws, end - ws);
    let distance = |pos: usize, len: usize| {
        if pos >= re {
            pos - re
        } else {
            rs.saturating_sub(pos + len)
        }
    };
    let nearest = |words: &[&str]| {
        words
            .iter()
            .filter_map(|w| find_term(&lower, w).map(|pos| distance(pos, w.len())))
            .min()
    };

    match (nearest(FASTING_WORDS), nearest(POST_MEAL_WORDS)) {
        (Some(f), Some(p)) if p < f => VitalType::PostprandialGlucose,
        (Some(_), _) => VitalType::FastingGlucose,
        (None, Some(_)) => VitalType::PostprandialGlucose,
        (None, None) => VitalType::RandomGlucose,
    }
}

fn derived_bmi(vitals: &[VitalSign]) -> Option<VitalSign> {
    let weight = vitals.iter().find(|v| v.vital_type == VitalType::Weight)?;
    let height = vitals.iter().find(|v| v.vital_type == VitalType::Height)?;
    let metres = height.value_primary / 100.0;
    if metres <= 0.0 {
        return None;
    }
    let bmi = round1(weight.value_primary / (metres * metres));
    Some(VitalSign::new(
        VitalType::BodyMassIndex,
        bmi,
        None,
        &format!("derived from {} and {}", weight.display(), height.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_type(vitals: &[VitalSign], t: VitalType) -> Option<&VitalSign> {
        vitals.iter().find(|v| v.vital_type == t)
    }

    #[test]
    fn blood_pressure_pair_and_pulse() {
        let vitals = extract_vitals("BP 150/95 mmHg, pulse 102/min");
        let bp = by_type(&vitals, VitalType::BloodPressure).unwrap();
        assert_eq!(bp.value, "150/95");
        assert!(bp.abnormal);
        let pulse = by_type(&vitals, VitalType::Pulse).unwrap();
        assert_eq!(pulse.value_primary, 102.0);
        assert!(pulse.abnormal);
    }

    #[test]
    fn expanded_vital_names_match() {
        let vitals = extract_vitals("Blood Pressure 120/80, Heart Rate 76, Respiratory Rate 16");
        assert_eq!(by_type(&vitals, VitalType::BloodPressure).unwrap().value, "120/80");
        assert_eq!(by_type(&vitals, VitalType::Pulse).unwrap().value, "76");
        assert_eq!(by_type(&vitals, VitalType::RespiratoryRate).unwrap().value, "16");
    }

    #[test]
    fn fahrenheit_converted_to_celsius() {
        let vitals = extract_vitals("Temp 102 F");
        let temp = by_type(&vitals, VitalType::Temperature).unwrap();
        assert_eq!(temp.value_primary, 38.9);

        let vitals = extract_vitals("temperature 37.2");
        assert_eq!(by_type(&vitals, VitalType::Temperature).unwrap().value_primary, 37.2);
    }

    #[test]
    fn fever_of_reading() {
        let vitals = extract_vitals("fever of 101 since yesterday");
        assert_eq!(by_type(&vitals, VitalType::Temperature).unwrap().value_primary, 38.3);
    }

    #[test]
    fn fever_duration_is_not_a_reading() {
        assert!(by_type(&extract_vitals("fever of 10 days"), VitalType::Temperature).is_none());
        assert!(by_type(&extract_vitals("fever of 12 hrs, no chills"), VitalType::Temperature).is_none());

        let vitals = extract_vitals("fever of 10 days, temp 100.4 F today");
        assert_eq!(by_type(&vitals, VitalType::Temperature).unwrap().value_primary, 38.0);
    }

    #[test]
    fn implausible_temperature_is_dropped() {
        assert!(by_type(&extract_vitals("temp 60"), VitalType::Temperature).is_none());
        assert!(by_type(&extract_vitals("temp 250"), VitalType::Temperature).is_none());
        assert!(by_type(&extract_vitals("temp 29"), VitalType::Temperature).is_none());
    }

    #[test]
    fn oxygen_saturation() {
        let vitals = extract_vitals("SpO2 85% on room air");
        let spo2 = by_type(&vitals, VitalType::OxygenSaturation).unwrap();
        assert_eq!(spo2.value, "85");
        assert!(spo2.abnormal);
    }

    #[test]
    fn bmi_derived_from_weight_and_height() {
        let vitals = extract_vitals("Weight 70 kg, height 1.75 m");
        assert_eq!(by_type(&vitals, VitalType::Height).unwrap().value_primary, 175.0);
        let bmi = by_type(&vitals, VitalType::BodyMassIndex).unwrap();
        assert_eq!(bmi.value_primary, 22.9);
        assert!(!bmi.abnormal);
    }

    #[test]
    fn no_bmi_without_height() {
        let vitals = extract_vitals("wt 70 kg");
        assert!(by_type(&vitals, VitalType::BodyMassIndex).is_none());
    }

    #[test]
    fn glucose_subtypes_from_nearby_words() {
        let vitals = extract_vitals("fasting sugar 130, after lunch sugar 210");
        assert_eq!(
            by_type(&vitals, VitalType::FastingGlucose).unwrap().value_primary,
            130.0
        );
        assert_eq!(
            by_type(&vitals, VitalType::PostprandialGlucose).unwrap().value_primary,
            210.0
        );
    }

    #[test]
    fn glucose_keyword_sets_subtype() {
        let vitals = extract_vitals("RBS 250");
        assert!(by_type(&vitals, VitalType::RandomGlucose).unwrap().abnormal);
    }

    #[test]
    fn unrelated_numbers_ignored() {
        assert!(extract_vitals("Tab Dolo 650 TDS for 5 days").is_empty());
    }
}
