use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GenerationRequest, LlmError, TextGenerator};

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    max_tokens: u32,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
            max_tokens: GenerationRequest::DEFAULT_MAX_TOKENS,
        })
    }

    /// Upper bound on `num_predict` regardless of what a request asks for.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    fn request_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_connect() {
            LlmError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl TextGenerator for OllamaClient {
    fn is_available(&self) -> bool {
        match self.list_models() {
            Ok(models) => models.iter().any(|m| m.starts_with(&self.model)),
            Err(e) => {
                tracing::debug!(error = %e, "Ollama availability check failed");
                false
            }
        }
    }

    fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: &request.system,
            stream: false,
            format: request.structured.then_some("json"),
            options: OllamaOptions {
                num_predict: request.max_tokens.min(self.max_tokens),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "medgemma", 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model(), "medgemma");
        assert_eq!(client.timeout_secs, 60);
        assert_eq!(client.max_tokens, GenerationRequest::DEFAULT_MAX_TOKENS);
        assert_eq!(client.with_max_tokens(128).max_tokens, 128);
    }

    #[test]
    fn structured_request_sets_json_format() {
        let body = OllamaGenerateRequest {
            model: "medgemma",
            prompt: "p",
            system: "s",
            stream: false,
            format: Some("json"),
            options: OllamaOptions { num_predict: 128 },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["options"]["num_predict"], 128);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn free_text_request_omits_format() {
        let body = OllamaGenerateRequest {
            model: "medgemma",
            prompt: "p",
            system: "s",
            stream: false,
            format: None,
            options: OllamaOptions { num_predict: 64 },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("format").is_none());
    }

    #[test]
    fn unreachable_server_is_unavailable() {
        // Port 9 (discard) is not an Ollama server.
        let client = OllamaClient::new("http://127.0.0.1:9", "medgemma", 1).unwrap();
        assert!(!client.is_available());
    }
}
