use serde::{Deserialize, Serialize};

/// A diagnosis named in the impression/assessment part of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub name: String,
    /// ICD-10 code from the terminology table.
    pub code: Option<String>,
    pub confidence: f32,
    pub is_primary: bool,
    pub is_differential: bool,
    pub supporting_evidence: Vec<String>,
}
