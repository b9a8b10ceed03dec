pub mod orchestrator;
pub mod sections;

pub use orchestrator::EncounterStructurer;
