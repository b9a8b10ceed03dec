use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: '{value}'")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde representation.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_lowercase();
                $(
                    if lower == $s.to_lowercase() {
                        return Ok(Self::$variant);
                    }
                )+
                Err(ParseEnumError {
                    field: stringify!($name).into(),
                    value: s.into(),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Ordered from least to most severe.
    Severity {
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
        Critical => "critical",
    }
);

str_enum!(Onset {
    Acute => "acute",
    Subacute => "subacute",
    Chronic => "chronic",
    Gradual => "gradual",
    Sudden => "sudden",
});

str_enum!(Route {
    Oral => "oral",
    Sublingual => "sublingual",
    Parenteral => "parenteral",
    Topical => "topical",
    Inhalation => "inhalation",
    Ophthalmic => "ophthalmic",
    Rectal => "rectal",
});

impl Default for Route {
    fn default() -> Self {
        Self::Oral
    }
}

str_enum!(
    /// Prescription frequency codes as written on Indian prescriptions.
    Frequency {
        Od => "OD",
        Bd => "BD",
        Tds => "TDS",
        Qid => "QID",
        Hs => "HS",
        Sos => "SOS",
        Stat => "STAT",
        Weekly => "WEEKLY",
    }
);

impl Default for Frequency {
    fn default() -> Self {
        Self::Od
    }
}

str_enum!(InvestigationKind {
    Lab => "lab",
    Imaging => "imaging",
    Procedure => "procedure",
});

str_enum!(
    /// Ordered from least to most pressing.
    Urgency {
        Routine => "routine",
        Urgent => "urgent",
        Stat => "stat",
    }
);

impl Default for Urgency {
    fn default() -> Self {
        Self::Routine
    }
}

str_enum!(ProcedureKind {
    Diagnostic => "diagnostic",
    Therapeutic => "therapeutic",
    Surgical => "surgical",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Critical > Severity::Severe);
        assert!(Severity::Severe > Severity::Moderate);
        assert!(Severity::Moderate > Severity::Mild);
    }

    #[test]
    fn urgency_is_ordered() {
        assert!(Urgency::Stat > Urgency::Urgent);
        assert!(Urgency::Urgent > Urgency::Routine);
    }

    #[test]
    fn frequency_parses_case_insensitively() {
        assert_eq!(Frequency::from_str("tds").unwrap(), Frequency::Tds);
        assert_eq!(Frequency::from_str(" BD ").unwrap(), Frequency::Bd);
        assert_eq!(Frequency::Tds.as_str(), "TDS");
    }

    #[test]
    fn unknown_value_reports_field() {
        let err = Onset::from_str("eventually").unwrap_err();
        assert_eq!(err.field, "Onset");
        assert_eq!(err.value, "eventually");
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&Frequency::Tds).unwrap();
        assert_eq!(json, "\"TDS\"");
        let back: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(back, Severity::Critical);
    }

    #[test]
    fn defaults_match_prescription_conventions() {
        assert_eq!(Route::default(), Route::Oral);
        assert_eq!(Frequency::default(), Frequency::Od);
        assert_eq!(Urgency::default(), Urgency::Routine);
    }
}
