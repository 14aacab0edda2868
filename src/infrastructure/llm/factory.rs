use std::sync::Arc;
use std::time::Duration;

use super::completion_port::LlmCompletionPort;
use super::http_client::HttpClient;
use super::OpenAiProvider;
use crate::config::LlmConfig;
use crate::domain::completion::CompletionPort;
use crate::domain::{DomainError, LlmProvider};

/// Factory for creating LLM providers and completion ports
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an OpenAI-compatible provider from configuration
    pub fn create(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let api_key = resolve_api_key(config, |name| std::env::var(name).ok())?;
        let http_client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

        Ok(Arc::new(OpenAiProvider::with_base_url(
            http_client,
            api_key,
            &config.base_url,
        )))
    }

    /// Create an OpenAI provider directly
    pub fn create_openai(api_key: impl Into<String>) -> Arc<dyn LlmProvider> {
        Arc::new(OpenAiProvider::new(HttpClient::new(), api_key))
    }
}

/// Build the completion port every workflow call goes through
pub fn create_completion_port(config: &LlmConfig) -> Result<Arc<dyn CompletionPort>, DomainError> {
    if config.model.trim().is_empty() {
        return Err(DomainError::configuration("LLM model must not be empty"));
    }

    let provider = LlmProviderFactory::create(config)?;

    Ok(Arc::new(
        LlmCompletionPort::new(provider, &config.model).with_temperature(config.temperature),
    ))
}

fn resolve_api_key(
    config: &LlmConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, DomainError> {
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    lookup(&config.api_key_env)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            DomainError::configuration(format!(
                "No API key configured; set llm.api_key or {}",
                config.api_key_env
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            api_key_env: "TEST_LLM_KEY".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_inline_key_wins() {
        let config = LlmConfig {
            api_key: Some("sk-inline".to_string()),
            ..config()
        };

        let key = resolve_api_key(&config, |_| Some("sk-env".to_string())).unwrap();
        assert_eq!(key, "sk-inline");
    }

    #[test]
    fn test_key_from_env() {
        let key = resolve_api_key(&config(), |name| {
            (name == "TEST_LLM_KEY").then(|| "sk-env".to_string())
        })
        .unwrap();

        assert_eq!(key, "sk-env");
    }

    #[test]
    fn test_missing_key() {
        let result = resolve_api_key(&config(), |_| None);

        match result {
            Err(DomainError::Configuration { message }) => {
                assert!(message.contains("TEST_LLM_KEY"));
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_completion_port() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..config()
        };

        assert!(create_completion_port(&config).is_ok());
    }

    #[test]
    fn test_empty_model_rejected() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            model: " ".to_string(),
            ..config()
        };

        assert!(matches!(
            create_completion_port(&config),
            Err(DomainError::Configuration { .. })
        ));
    }
}
