//! Workflow error types

use thiserror::Error;

use crate::domain::completion::{CompletionError, DecodeError};
use crate::domain::prompt::TemplateError;
use crate::domain::DomainError;

/// Errors that can occur while running a workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Completion failed: {0}")]
    Completion(#[source] DomainError),

    #[error("Step {index} failed: {source}")]
    StepFailed {
        index: usize,
        #[source]
        source: DomainError,
    },

    #[error("Aggregation failed: {message}")]
    AggregationFailed { message: String },

    #[error("Decomposition failed: {message}")]
    DecompositionFailed { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Workflow cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn step_failed(index: usize, source: DomainError) -> Self {
        Self::StepFailed { index, source }
    }

    pub fn aggregation_failed(message: impl Into<String>) -> Self {
        Self::AggregationFailed {
            message: message.into(),
        }
    }

    pub fn decomposition_failed(message: impl Into<String>) -> Self {
        Self::DecompositionFailed {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<CompletionError> for WorkflowError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Provider(e) => Self::Completion(e),
            CompletionError::Decode(e) => Self::Decode(e),
            CompletionError::Cancelled => Self::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkflowError::step_failed(2, DomainError::provider("openai", "HTTP 503"));
        assert_eq!(
            err.to_string(),
            "Step 2 failed: Provider error: openai - HTTP 503"
        );

        let err = WorkflowError::from(TemplateError::unbound("task"));
        assert_eq!(err.to_string(), "Unbound placeholder: task");

        let err = WorkflowError::aggregation_failed("input 1 failed");
        assert_eq!(err.to_string(), "Aggregation failed: input 1 failed");
    }

    #[test]
    fn test_from_completion_error() {
        assert!(WorkflowError::from(CompletionError::Cancelled).is_cancelled());

        let err = WorkflowError::from(CompletionError::Decode(DecodeError::new("x", "bad")));
        assert!(matches!(err, WorkflowError::Decode(_)));

        let err = WorkflowError::from(CompletionError::Provider(DomainError::internal("x")));
        assert!(matches!(err, WorkflowError::Completion(_)));
    }
}
