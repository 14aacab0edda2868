//! LLM provider implementations

mod completion_port;
mod factory;
mod http_client;
mod openai;

pub use completion_port::LlmCompletionPort;
pub use factory::{create_completion_port, LlmProviderFactory};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
