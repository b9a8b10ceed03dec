use super::{GenerationRequest, LlmError, TextGenerator};

/// Test collaborator returning a fixed response or a fixed failure.
pub struct MockTextGenerator {
    response: Option<String>,
    available: bool,
}

impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            available: true,
        }
    }

    /// Available, but every request fails.
    pub fn failing() -> Self {
        Self {
            response: None,
            available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl TextGenerator for MockTextGenerator {
    fn is_available(&self) -> bool {
        self.available
    }

    fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
        self.response
            .clone()
            .ok_or_else(|| LlmError::HttpClient("mock failure".into()))
    }
}
