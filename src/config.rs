use std::path::{Path, PathBuf};

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Medscribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_KNOWLEDGE_DIR: &str = "MEDSCRIBE_KNOWLEDGE_DIR";
pub const ENV_LLM_ENABLED: &str = "MEDSCRIBE_LLM_ENABLED";
pub const ENV_OLLAMA_URL: &str = "MEDSCRIBE_OLLAMA_URL";
pub const ENV_LLM_MODEL: &str = "MEDSCRIBE_LLM_MODEL";
pub const ENV_LLM_TIMEOUT_SECS: &str = "MEDSCRIBE_LLM_TIMEOUT_SECS";
pub const ENV_LLM_MAX_TOKENS: &str = "MEDSCRIBE_LLM_MAX_TOKENS";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "medscribe=debug,medscribe_lib=debug,warn"
    } else {
        "medscribe=info,medscribe_lib=info,warn"
    }
}

/// ~/.medscribe/, when a home directory can be determined.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".medscribe"))
}

/// ~/.medscribe/knowledge/, if it exists.
pub fn user_knowledge_dir() -> Option<PathBuf> {
    app_data_dir()
        .map(|dir| dir.join("knowledge"))
        .filter(|dir| dir.is_dir())
}

/// Settings for the optional Ollama collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434".into(),
            model: "medgemma".into(),
            timeout_secs: 20,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// Directory holding the knowledge tables; `None` uses the bundled ones.
    pub knowledge_dir: Option<PathBuf>,
    pub llm: LlmConfig,
}

impl EngineConfig {
    /// Defaults overridden by `MEDSCRIBE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        if config.knowledge_dir.is_none() {
            config.knowledge_dir = user_knowledge_dir();
        }
        Ok(config)
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = value(ENV_KNOWLEDGE_DIR) {
            config.knowledge_dir = Some(PathBuf::from(dir));
        }
        if let Some(enabled) = value(ENV_LLM_ENABLED) {
            config.llm.enabled = parse_bool(ENV_LLM_ENABLED, &enabled)?;
        }
        if let Some(url) = value(ENV_OLLAMA_URL) {
            config.llm.base_url = url;
        }
        if let Some(model) = value(ENV_LLM_MODEL) {
            config.llm.model = model;
        }
        if let Some(timeout) = value(ENV_LLM_TIMEOUT_SECS) {
            config.llm.timeout_secs = parse_positive(ENV_LLM_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(tokens) = value(ENV_LLM_MAX_TOKENS) {
            config.llm.max_tokens = parse_positive(ENV_LLM_MAX_TOKENS, &tokens)?;
        }

        Ok(config)
    }

    pub fn with_knowledge_dir(mut self, dir: &Path) -> Self {
        self.knowledge_dir = Some(dir.to_path_buf());
        self
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

fn parse_positive<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected a positive integer".into(),
        }),
    }
}
