use serde::{Deserialize, Serialize};

use super::enums::{Frequency, Route};

/// A prescribed drug line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    /// Name as written on the prescription.
    pub name: String,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    /// Amount per administration ("1 tab", "5 ml").
    pub dose: Option<String>,
    /// Strength of the formulation ("650mg").
    pub strength: Option<String>,
    pub route: Route,
    pub frequency: Frequency,
    pub duration: Option<String>,
    pub instructions: Vec<String>,
    pub reason: Option<String>,
    pub context: String,
}
