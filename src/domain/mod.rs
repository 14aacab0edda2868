//! Domain layer - Core business logic and entities

pub mod completion;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod workflow;

pub use completion::{
    CompletionClient, CompletionError, CompletionPort, CompletionRequest, DecodeError,
    ResponseSchema, StructuredOutput,
};
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use prompt::{Prompt, PromptTemplate, TemplateError};
pub use workflow::{
    AggregatedResult, ChainOutcome, ChainStep, FanOutRequest, OrchestratorResult,
    OrchestratorTemplates, RefineOutcome, RefineRequest, WorkflowConfig, WorkflowEngine,
    WorkflowError,
};
