use serde::{Deserialize, Serialize};

/// Type of vital sign measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalType {
    BloodPressure,
    Pulse,
    Temperature,
    OxygenSaturation,
    RespiratoryRate,
    Weight,
    Height,
    BodyMassIndex,
    FastingGlucose,
    PostprandialGlucose,
    RandomGlucose,
}

impl VitalType {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "blood_pressure",
            VitalType::Pulse => "pulse",
            VitalType::Temperature => "temperature",
            VitalType::OxygenSaturation => "oxygen_saturation",
            VitalType::RespiratoryRate => "respiratory_rate",
            VitalType::Weight => "weight",
            VitalType::Height => "height",
            VitalType::BodyMassIndex => "body_mass_index",
            VitalType::FastingGlucose => "fasting_glucose",
            VitalType::PostprandialGlucose => "postprandial_glucose",
            VitalType::RandomGlucose => "random_glucose",
        }
    }

    /// Key used in the encounter vitals map, in the shorthand clinicians chart with.
    pub fn key(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "BP",
            VitalType::Pulse => "Pulse",
            VitalType::Temperature => "Temperature",
            VitalType::OxygenSaturation => "SpO2",
            VitalType::RespiratoryRate => "RR",
            VitalType::Weight => "Weight",
            VitalType::Height => "Height",
            VitalType::BodyMassIndex => "BMI",
            VitalType::FastingGlucose => "FBS",
            VitalType::PostprandialGlucose => "PPBS",
            VitalType::RandomGlucose => "RBS",
        }
    }

    /// Default unit for this vital type.
    pub fn default_unit(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "mmHg",
            VitalType::Pulse => "bpm",
            VitalType::Temperature => "°C",
            VitalType::OxygenSaturation => "%",
            VitalType::RespiratoryRate => "/min",
            VitalType::Weight => "kg",
            VitalType::Height => "cm",
            VitalType::BodyMassIndex => "kg/m²",
            VitalType::FastingGlucose
            | VitalType::PostprandialGlucose
            | VitalType::RandomGlucose => "mg/dL",
        }
    }

    /// Adult reference limits. `secondary` is the diastolic pressure for blood pressure.
    pub fn is_abnormal(self, primary: f64, secondary: Option<f64>) -> bool {
        match self {
            VitalType::BloodPressure => {
                let diastolic = secondary.unwrap_or(0.0);
                primary >= 140.0 || primary < 90.0 || diastolic >= 90.0 || diastolic < 60.0
            }
            VitalType::Pulse => !(60.0..=100.0).contains(&primary),
            VitalType::Temperature => !(36.0..=37.5).contains(&primary),
            VitalType::OxygenSaturation => primary < 95.0,
            VitalType::RespiratoryRate => !(12.0..=20.0).contains(&primary),
            VitalType::BodyMassIndex => !(18.5..25.0).contains(&primary),
            VitalType::FastingGlucose => !(70.0..=100.0).contains(&primary),
            VitalType::PostprandialGlucose => !(70.0..=140.0).contains(&primary),
            VitalType::RandomGlucose => !(70.0..=200.0).contains(&primary),
            VitalType::Weight | VitalType::Height => false,
        }
    }
}

/// A single vital sign measurement read from narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSign {
    pub vital_type: VitalType,
    pub name: String,
    /// Display value, e.g. "140/90" or "38.3".
    pub value: String,
    pub value_primary: f64,
    pub value_secondary: Option<f64>, // diastolic for blood_pressure
    pub unit: String,
    pub abnormal: bool,
    pub context: String,
}

impl VitalSign {
    pub fn new(vital_type: VitalType, primary: f64, secondary: Option<f64>, context: &str) -> Self {
        let value = match secondary {
            Some(diastolic) => format!("{}/{}", format_number(primary), format_number(diastolic)),
            None => format_number(primary),
        };
        Self {
            vital_type,
            name: vital_type.key().to_string(),
            value,
            value_primary: primary,
            value_secondary: secondary,
            unit: vital_type.default_unit().to_string(),
            abnormal: vital_type.is_abnormal(primary, secondary),
            context: context.to_string(),
        }
    }

    /// "140/90 mmHg"
    pub fn display(&self) -> String {
        format!("{} {}", self.value, self.unit)
    }
}

/// Drop a trailing ".0" so whole readings print the way they were charted.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_pressure_value_is_pair() {
        let vital = VitalSign::new(VitalType::BloodPressure, 150.0, Some(95.0), "BP 150/95");
        assert_eq!(vital.value, "150/95");
        assert_eq!(vital.name, "BP");
        assert!(vital.abnormal);
        assert_eq!(vital.display(), "150/95 mmHg");
    }

    #[test]
    fn normal_pulse_not_flagged() {
        let vital = VitalSign::new(VitalType::Pulse, 82.0, None, "");
        assert!(!vital.abnormal);
        assert_eq!(vital.value, "82");
    }

    #[test]
    fn fractional_temperature_kept() {
        let vital = VitalSign::new(VitalType::Temperature, 38.9, None, "");
        assert_eq!(vital.value, "38.9");
        assert!(vital.abnormal);
    }

    #[test]
    fn low_saturation_flagged() {
        assert!(VitalType::OxygenSaturation.is_abnormal(91.0, None));
        assert!(!VitalType::OxygenSaturation.is_abnormal(98.0, None));
    }
}
