pub mod text;
pub mod normalize;
pub mod extraction;
pub mod structuring;
pub mod reasoning;
pub mod summarizer;
pub mod llm;
