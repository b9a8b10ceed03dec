use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ProcedureKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub kind: ProcedureKind,
    pub indication: Option<String>,
    pub date_performed: Option<NaiveDate>,
    pub outcome: Option<String>,
    pub complications: Vec<String>,
}
