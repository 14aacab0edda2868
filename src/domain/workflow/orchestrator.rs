//! Orchestrator-workers workflow - decompose a task, then dispatch each
//! subtask to a specialised worker prompt
//!
//! The decomposition call must return a structured `{analysis, tasks}` record;
//! a response that does not decode fails the run. Worker calls are isolated
//! from each other: a failed subtask is recorded on its own outcome and the
//! remaining subtasks still run.

use std::collections::HashMap;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::placeholders::{ORIGINAL_TASK, TASK, TASK_DESCRIPTION, TASK_TYPE};
use super::{presets, WorkflowError};
use crate::domain::completion::{
    CompletionClient, CompletionError, ResponseSchema, StructuredOutput,
};
use crate::domain::prompt::PromptTemplate;

/// A subtask produced by decomposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Specialism the subtask needs, e.g. "Backend API"
    #[serde(rename = "type")]
    pub task_type: String,
    pub description: String,
}

impl Task {
    pub fn new(task_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            description: description.into(),
        }
    }
}

/// Structured answer of the decomposition call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionResponse {
    pub analysis: String,
    pub tasks: Vec<Task>,
}

impl StructuredOutput for DecompositionResponse {
    fn schema() -> ResponseSchema {
        ResponseSchema::new(
            "decomposition",
            json!({
                "type": "object",
                "properties": {
                    "analysis": { "type": "string" },
                    "tasks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "type": { "type": "string" },
                                "description": { "type": "string" }
                            },
                            "required": ["type", "description"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["analysis", "tasks"],
                "additionalProperties": false
            }),
        )
    }
}

/// A worker call that failed; local to its subtask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Subtask failed: {message}")]
pub struct SubtaskFailed {
    pub message: String,
}

impl SubtaskFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of one dispatched subtask
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtaskOutcome {
    pub task: Task,
    pub output: Result<String, SubtaskFailed>,
}

impl SubtaskOutcome {
    pub fn is_success(&self) -> bool {
        self.output.is_ok()
    }
}

/// Result of a decompose/dispatch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestratorResult {
    pub analysis: String,
    /// One outcome per decomposed task, in decomposition order
    pub outcomes: Vec<SubtaskOutcome>,
}

impl OrchestratorResult {
    /// Outputs of the subtasks that succeeded
    pub fn worker_responses(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.output.as_deref().ok())
            .collect()
    }
}

/// Prompts used by the orchestrator
///
/// The decomposition template binds `{task}`; the worker template binds
/// `{original_task}`, `{task_type}` and `{task_description}`.
#[derive(Debug, Clone)]
pub struct OrchestratorTemplates {
    pub decomposition: PromptTemplate,
    pub worker: PromptTemplate,
}

impl OrchestratorTemplates {
    pub fn new(
        decomposition: impl Into<PromptTemplate>,
        worker: impl Into<PromptTemplate>,
    ) -> Self {
        Self {
            decomposition: decomposition.into(),
            worker: worker.into(),
        }
    }
}

impl Default for OrchestratorTemplates {
    fn default() -> Self {
        Self::new(presets::ORCHESTRATOR_PROMPT, presets::WORKER_PROMPT)
    }
}

/// How worker calls are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One subtask at a time, in order
    Sequential,
    /// All subtasks at once, bounded by the client's concurrency limit
    #[default]
    Concurrent,
}

/// Runs decompose/dispatch requests against a completion client
#[derive(Debug, Clone)]
pub struct OrchestratorWorkers {
    client: CompletionClient,
    templates: OrchestratorTemplates,
    mode: DispatchMode,
}

impl OrchestratorWorkers {
    pub fn new(client: CompletionClient, templates: OrchestratorTemplates) -> Self {
        Self {
            client,
            templates,
            mode: DispatchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn templates(&self) -> &OrchestratorTemplates {
        &self.templates
    }

    pub async fn run(
        &self,
        task_description: &str,
        cancel: &CancellationToken,
    ) -> Result<OrchestratorResult, WorkflowError> {
        self.templates.decomposition.check_bindings(&[TASK])?;
        self.templates
            .worker
            .check_bindings(&[ORIGINAL_TASK, TASK_TYPE, TASK_DESCRIPTION])?;

        let decomposition = self.decompose(task_description, cancel).await?;

        info!(
            tasks = decomposition.tasks.len(),
            analysis = %decomposition.analysis,
            "Task decomposed"
        );

        if decomposition.tasks.is_empty() {
            return Ok(OrchestratorResult {
                analysis: decomposition.analysis,
                outcomes: Vec::new(),
            });
        }

        let outcomes = match self.mode {
            DispatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(decomposition.tasks.len());
                for task in &decomposition.tasks {
                    outcomes.push(self.dispatch(task_description, task, cancel).await?);
                }
                outcomes
            }
            DispatchMode::Concurrent => join_all(
                decomposition
                    .tasks
                    .iter()
                    .map(|task| self.dispatch(task_description, task, cancel)),
            )
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?,
        };

        info!(
            tasks = outcomes.len(),
            failed = outcomes.iter().filter(|o| !o.is_success()).count(),
            "All workers finished"
        );

        Ok(OrchestratorResult {
            analysis: decomposition.analysis,
            outcomes,
        })
    }

    async fn decompose(
        &self,
        task_description: &str,
        cancel: &CancellationToken,
    ) -> Result<DecompositionResponse, WorkflowError> {
        let bindings = HashMap::from([(TASK.to_string(), task_description.to_string())]);
        let prompt = self.templates.decomposition.render(&bindings)?;

        match self
            .client
            .complete_structured::<DecompositionResponse>(prompt, cancel)
            .await
        {
            Ok(response) => Ok(response),
            Err(CompletionError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(e) => Err(WorkflowError::decomposition_failed(e.to_string())),
        }
    }

    /// Run one worker call. Only cancellation escapes as an error.
    async fn dispatch(
        &self,
        task_description: &str,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<SubtaskOutcome, WorkflowError> {
        let bindings = HashMap::from([
            (ORIGINAL_TASK.to_string(), task_description.to_string()),
            (TASK_TYPE.to_string(), task.task_type.clone()),
            (TASK_DESCRIPTION.to_string(), task.description.clone()),
        ]);
        let prompt = self.templates.worker.render(&bindings)?;

        debug!(task_type = %task.task_type, "Dispatching subtask");

        let output = match self.client.complete(prompt, cancel).await {
            Ok(output) => Ok(output),
            Err(CompletionError::Cancelled) => return Err(WorkflowError::Cancelled),
            Err(e) => {
                warn!(task_type = %task.task_type, error = %e, "Subtask failed");
                Err(SubtaskFailed::new(e.to_string()))
            }
        };

        Ok(SubtaskOutcome {
            task: task.clone(),
            output,
        })
    }
}
