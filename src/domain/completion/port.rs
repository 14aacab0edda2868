use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ResponseSchema;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// A single prompt submitted to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Expected shape of the answer, if a structured result is wanted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<ResponseSchema>,
}

impl CompletionRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    pub fn structured(prompt: impl Into<String>, schema: ResponseSchema) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }
}

/// Submit a prompt, get model text back.
///
/// Implementations must be safe to call concurrently; fan-out workers share
/// one port. Transport, retries and backoff belong to the implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionPort: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Reply produced by a `ScriptedCompletionPort` for one call
    #[derive(Debug, Clone)]
    pub enum ScriptedReply {
        Text(String),
        Fail(String),
        Delayed { delay: Duration, text: String },
        /// Never completes; used to exercise cancellation
        Hang,
    }

    impl ScriptedReply {
        pub fn text(text: impl Into<String>) -> Self {
            Self::Text(text.into())
        }

        pub fn fail(message: impl Into<String>) -> Self {
            Self::Fail(message.into())
        }
    }

    type Handler = Box<dyn Fn(&CompletionRequest, usize) -> ScriptedReply + Send + Sync>;

    /// Completion port driven by a closure, recording every request it sees
    pub struct ScriptedCompletionPort {
        handler: Handler,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletionPort {
        /// The handler receives the request and the zero-based call index
        pub fn new(
            handler: impl Fn(&CompletionRequest, usize) -> ScriptedReply + Send + Sync + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Replies in order; the last reply repeats once the list is exhausted
        pub fn sequence(replies: Vec<ScriptedReply>) -> Self {
            Self::new(move |_, index| {
                replies
                    .get(index)
                    .or_else(|| replies.last())
                    .cloned()
                    .unwrap_or(ScriptedReply::Fail("no scripted reply".to_string()))
            })
        }

        pub fn calls(&self) -> Vec<CompletionRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c.prompt).collect()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionPort for ScriptedCompletionPort {
        async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError> {
            let reply = {
                let mut calls = self.calls.lock().unwrap();
                let index = calls.len();
                calls.push(request.clone());
                (self.handler)(&request, index)
            };

            match reply {
                ScriptedReply::Text(text) => Ok(text),
                ScriptedReply::Fail(message) => Err(DomainError::provider("scripted", message)),
                ScriptedReply::Delayed { delay, text } => {
                    tokio::time::sleep(delay).await;
                    Ok(text)
                }
                ScriptedReply::Hang => std::future::pending().await,
            }
        }
    }
}
