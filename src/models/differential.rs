use serde::{Deserialize, Serialize};

use super::enums::{Severity, Urgency};

/// A ranked candidate diagnosis with the evidence behind its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Differential {
    pub diagnosis: String,
    pub code: Option<String>,
    /// Posterior probability, never above 0.95.
    pub probability: f64,
    pub prior: f64,
    /// Symptom names that contributed likelihood ratios.
    pub supporting_features: Vec<String>,
    pub recommended_investigations: Vec<String>,
    pub red_flags: Vec<String>,
    pub urgency: Urgency,
}

/// A finding that mandates urgent action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub action: String,
    pub time_critical: bool,
    pub body_system: String,
}
