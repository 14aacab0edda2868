//! Evaluator-optimizer workflow - generate, evaluate, refine
//!
//! Each round renders the generation template with the task and the
//! accumulated context, decodes a `{thoughts, response}` record, then asks the
//! evaluation template for a `{evaluation, feedback}` verdict on that response.
//! `PASS` ends the loop with a solution, `FAIL` ends it unresolved, and
//! `NEEDS_IMPROVEMENT` feeds the response and feedback into the next round.
//! The loop never runs more than `max_iterations` rounds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::placeholders::{CONTEXT, RESPONSE, TASK};
use super::WorkflowError;
use crate::domain::completion::{CompletionClient, ResponseSchema, StructuredOutput};
use crate::domain::prompt::PromptTemplate;

/// Structured answer of a generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub thoughts: String,
    pub response: String,
}

impl StructuredOutput for Generation {
    fn schema() -> ResponseSchema {
        ResponseSchema::new(
            "generation",
            json!({
                "type": "object",
                "properties": {
                    "thoughts": { "type": "string" },
                    "response": { "type": "string" }
                },
                "required": ["thoughts", "response"],
                "additionalProperties": false
            }),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationVerdict {
    Pass,
    NeedsImprovement,
    Fail,
}

/// Structured answer of an evaluation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub evaluation: EvaluationVerdict,
    pub feedback: String,
}

impl StructuredOutput for EvaluationResponse {
    fn schema() -> ResponseSchema {
        ResponseSchema::new(
            "evaluation",
            json!({
                "type": "object",
                "properties": {
                    "evaluation": {
                        "type": "string",
                        "enum": ["PASS", "NEEDS_IMPROVEMENT", "FAIL"]
                    },
                    "feedback": { "type": "string" }
                },
                "required": ["evaluation", "feedback"],
                "additionalProperties": false
            }),
        )
    }
}

/// Loop state carried between rounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationState {
    /// Zero-based round number
    pub iteration: usize,
    /// Previous attempt and feedback; empty on the first round
    pub context: String,
}

impl IterationState {
    /// State for the round after a rejected attempt
    pub fn next(&self, response: &str, feedback: &str) -> Self {
        Self {
            iteration: self.iteration + 1,
            context: format!(
                "previous attempt:\n{}\n\nfeedback:\n{}\n\nimprove accordingly.",
                response, feedback
            ),
        }
    }
}

/// Input of a refine loop run
#[derive(Debug, Clone)]
pub struct RefineRequest {
    pub task: String,
    /// Binds `{task}` and `{context}`
    pub generation_template: PromptTemplate,
    /// Binds `{task}` and `{response}`
    pub evaluation_template: PromptTemplate,
    pub max_iterations: usize,
}

impl RefineRequest {
    pub fn new(
        task: impl Into<String>,
        generation_template: impl Into<PromptTemplate>,
        evaluation_template: impl Into<PromptTemplate>,
        max_iterations: usize,
    ) -> Self {
        Self {
            task: task.into(),
            generation_template: generation_template.into(),
            evaluation_template: evaluation_template.into(),
            max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineStopReason {
    /// The evaluator returned `FAIL`
    Rejected,
    /// `max_iterations` rounds ran without a `PASS`
    IterationLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefineOutcome {
    Solved {
        solution: String,
        iterations: usize,
        /// Every generation, in order
        history: Vec<Generation>,
    },
    Unresolved {
        reason: RefineStopReason,
        /// Feedback from the last evaluation
        feedback: String,
        iterations: usize,
        history: Vec<Generation>,
    },
}

impl RefineOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            Self::Solved { iterations, .. } | Self::Unresolved { iterations, .. } => *iterations,
        }
    }

    pub fn history(&self) -> &[Generation] {
        match self {
            Self::Solved { history, .. } | Self::Unresolved { history, .. } => history,
        }
    }
}

/// Runs refine loops against a completion client
#[derive(Debug, Clone)]
pub struct EvaluatorOptimizer {
    client: CompletionClient,
}

impl EvaluatorOptimizer {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    pub async fn run(
        &self,
        request: &RefineRequest,
        cancel: &CancellationToken,
    ) -> Result<RefineOutcome, WorkflowError> {
        if request.max_iterations == 0 {
            return Err(WorkflowError::invalid_input(
                "max_iterations must be at least 1",
            ));
        }

        request.generation_template.check_bindings(&[TASK, CONTEXT])?;
        request.evaluation_template.check_bindings(&[TASK, RESPONSE])?;

        let mut state = IterationState::default();
        let mut history = Vec::new();

        loop {
            info!(
                iteration = state.iteration + 1,
                max_iterations = request.max_iterations,
                "Refine round"
            );

            let generation = self.generate(request, &state, cancel).await?;
            debug!(
                iteration = state.iteration + 1,
                response = %generation.response,
                "Generated"
            );

            let evaluation = self.evaluate(request, &generation.response, cancel).await?;
            info!(
                iteration = state.iteration + 1,
                verdict = ?evaluation.evaluation,
                "Evaluated"
            );

            let iterations = state.iteration + 1;
            let response = generation.response.clone();
            history.push(generation);

            match evaluation.evaluation {
                EvaluationVerdict::Pass => {
                    return Ok(RefineOutcome::Solved {
                        solution: response,
                        iterations,
                        history,
                    });
                }
                EvaluationVerdict::Fail => {
                    return Ok(RefineOutcome::Unresolved {
                        reason: RefineStopReason::Rejected,
                        feedback: evaluation.feedback,
                        iterations,
                        history,
                    });
                }
                EvaluationVerdict::NeedsImprovement if iterations >= request.max_iterations => {
                    info!(iterations, "Refine loop hit iteration limit");
                    return Ok(RefineOutcome::Unresolved {
                        reason: RefineStopReason::IterationLimit,
                        feedback: evaluation.feedback,
                        iterations,
                        history,
                    });
                }
                EvaluationVerdict::NeedsImprovement => {
                    state = state.next(&response, &evaluation.feedback);
                }
            }
        }
    }

    async fn generate(
        &self,
        request: &RefineRequest,
        state: &IterationState,
        cancel: &CancellationToken,
    ) -> Result<Generation, WorkflowError> {
        let bindings = HashMap::from([
            (TASK.to_string(), request.task.clone()),
            (CONTEXT.to_string(), state.context.clone()),
        ]);
        let prompt = request.generation_template.render(&bindings)?;

        Ok(self.client.complete_structured(prompt, cancel).await?)
    }

    async fn evaluate(
        &self,
        request: &RefineRequest,
        response: &str,
        cancel: &CancellationToken,
    ) -> Result<EvaluationResponse, WorkflowError> {
        let bindings = HashMap::from([
            (TASK.to_string(), request.task.clone()),
            (RESPONSE.to_string(), response.to_string()),
        ]);
        let prompt = request.evaluation_template.render(&bindings)?;

        Ok(self.client.complete_structured(prompt, cancel).await?)
    }
}
