use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DEV_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment or .env file")]
    MissingVar(&'static str),
}

/// Everything the generation client needs, read once at startup.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.0,
            max_output_tokens: 2048,
            timeout: Duration::from_secs(120),
        }
    }

    /// Reads `GEMINI_API_KEY` and the optional `GEMINI_MODEL` override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            env::var("GEMINI_API_KEY").map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY"))?;
        let mut config = Self::new(api_key);
        if let Ok(model) = env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiTarget {
    Development,
    Production,
}

impl ApiTarget {
    pub fn from_flag(production: bool) -> Self {
        if production {
            ApiTarget::Production
        } else {
            ApiTarget::Development
        }
    }

    /// Base URL of the content server for this target.
    ///
    /// Development falls back to the local server; production has no default.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        match self {
            ApiTarget::Development => Ok(env::var("CONTENT_API_DEV_URL")
                .unwrap_or_else(|_| DEFAULT_DEV_API_URL.to_string())),
            ApiTarget::Production => env::var("CONTENT_API_PROD_URL")
                .map_err(|_| ConfigError::MissingVar("CONTENT_API_PROD_URL")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::new("key");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_output_tokens, 2048);
    }

    #[test]
    fn test_target_from_flag() {
        assert_eq!(ApiTarget::from_flag(true), ApiTarget::Production);
        assert_eq!(ApiTarget::from_flag(false), ApiTarget::Development);
    }
}
