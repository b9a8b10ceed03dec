use serde::{Deserialize, Serialize};

use super::enums::{InvestigationKind, Urgency};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub name: String,
    pub kind: InvestigationKind,
    pub urgency: Urgency,
    pub reason: Option<String>,
    pub timing: Option<String>,
    pub context: String,
}
