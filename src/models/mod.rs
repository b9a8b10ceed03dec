pub mod context;
pub mod diagnosis;
pub mod differential;
pub mod drug;
pub mod encounter;
pub mod enums;
pub mod investigation;
pub mod procedure;
pub mod symptom;
pub mod vital_sign;

pub use context::ClinicalContext;
pub use diagnosis::Diagnosis;
pub use differential::{Differential, RedFlag};
pub use drug::Drug;
pub use encounter::{Assessment, Encounter, EncounterMetadata, Objective, Plan, Subjective};
pub use enums::*;
pub use investigation::Investigation;
pub use procedure::Procedure;
pub use symptom::Symptom;
pub use vital_sign::{VitalSign, VitalType};
