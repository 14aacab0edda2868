use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::domain::completion::{CompletionPort, CompletionRequest, ResponseSchema};
use crate::domain::llm::{LlmJsonSchema, LlmResponseFormat};
use crate::domain::{DomainError, LlmProvider, LlmRequest};

/// Completion port backed by a chat provider and a fixed model
#[derive(Debug, Clone)]
pub struct LlmCompletionPort {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: Option<f32>,
}

impl LlmCompletionPort {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: CompletionRequest) -> LlmRequest {
        let mut builder = LlmRequest::builder().user(request.prompt);

        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        if let Some(schema) = request.response_schema {
            builder = builder.response_format(json_schema_format(schema));
        }

        builder.build()
    }
}

fn json_schema_format(schema: ResponseSchema) -> LlmResponseFormat {
    LlmResponseFormat::JsonSchema {
        json_schema: LlmJsonSchema {
            name: schema.name,
            schema: schema.schema,
            strict: false,
        },
    }
}

#[async_trait]
impl CompletionPort for LlmCompletionPort {
    async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError> {
        let llm_request = self.build_request(request);
        let response = self.provider.chat(&self.model, llm_request).await?;

        debug!(
            provider = self.provider.provider_name(),
            model = %self.model,
            finish_reason = ?response.finish_reason,
            "Chat completion received"
        );

        let content = response.content();
        if content.trim().is_empty() {
            return Err(DomainError::provider(
                self.provider.provider_name(),
                "Empty completion content",
            ));
        }

        Ok(content.to_string())
    }
}
