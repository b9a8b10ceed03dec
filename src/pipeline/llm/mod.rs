//! Optional text-generation collaborator.
//!
//! Generation is never required for a correct result: callers compute the
//! deterministic answer first and only use generated text when
//! `is_available()` holds and `generate()` succeeds.

pub mod mock;
pub mod ollama;

pub use mock::MockTextGenerator;
pub use ollama::OllamaClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Ollama returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Text generation is disabled")]
    Disabled,
}

/// One prompt for the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: String,
    /// Ask for a JSON document instead of free text.
    pub structured: bool,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub const DEFAULT_MAX_TOKENS: u32 = 512;

    pub fn text(system: &str, prompt: String) -> Self {
        Self {
            prompt,
            system: system.to_string(),
            structured: false,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn json(system: &str, prompt: String) -> Self {
        Self {
            structured: true,
            ..Self::text(system, prompt)
        }
    }
}

/// Availability check plus a single timeout-bounded request/response.
pub trait TextGenerator: Send + Sync {
    fn is_available(&self) -> bool;

    fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

/// Stand-in when no collaborator is configured. Never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGenerator;

impl TextGenerator for NoopGenerator {
    fn is_available(&self) -> bool {
        false
    }

    fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }
}
