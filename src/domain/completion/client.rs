//! Shared access to a completion port
//!
//! Every model call made by the runners goes through a `CompletionClient`.
//! The client caps the number of in-flight calls with a semaphore shared by
//! all clones (and therefore by concurrent runner invocations), and races
//! each call against a cancellation token so a caller can abandon a long
//! chain or loop.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{decode_structured, CompletionPort, CompletionRequest, DecodeError, StructuredOutput};
use crate::domain::DomainError;

/// Failure of a single completion call
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Provider(#[from] DomainError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Completion cancelled")]
    Cancelled,
}

/// Cloneable handle over a completion port and its concurrency limit
#[derive(Clone)]
pub struct CompletionClient {
    port: Arc<dyn CompletionPort>,
    limiter: Arc<Semaphore>,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("available_permits", &self.limiter.available_permits())
            .finish()
    }
}

impl CompletionClient {
    /// Create a client allowing at most `max_concurrency` calls in flight
    pub fn new(port: Arc<dyn CompletionPort>, max_concurrency: usize) -> Self {
        Self {
            port,
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Number of calls that may start right now
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Complete a prompt, returning free text
    pub async fn complete(
        &self,
        prompt: String,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        self.invoke(CompletionRequest::text(prompt), cancel).await
    }

    /// Complete a prompt and decode the answer into `T`
    pub async fn complete_structured<T: StructuredOutput>(
        &self,
        prompt: String,
        cancel: &CancellationToken,
    ) -> Result<T, CompletionError> {
        let schema = T::schema();
        let text = self
            .invoke(CompletionRequest::structured(prompt, schema), cancel)
            .await?;

        decode_structured::<T>(&text).map_err(|e| {
            warn!(schema = %e.schema, error = %e.message, "Structured response did not decode");
            CompletionError::Decode(e)
        })
    }

    async fn invoke(
        &self,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
            permit = self.limiter.acquire() => permit
                .map_err(|_| DomainError::internal("Completion limiter closed"))?,
        };

        let prompt_chars = request.prompt.chars().count();
        let structured = request.response_schema.is_some();
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CompletionError::Cancelled),
            result = self.port.complete(request) => result.map_err(CompletionError::from),
        };

        debug!(
            prompt_chars,
            structured,
            latency_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Completion call finished"
        );

        result
    }
}
