use thiserror::Error;

use crate::config::ConfigError;
use crate::knowledge::KnowledgeError;
use crate::pipeline::llm::LlmError;

/// Failures at the edges: engine construction and the command line.
/// Pipeline operations themselves do not fail.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Text generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
