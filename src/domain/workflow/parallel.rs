//! Parallelization workflow - fan out one template over many inputs, then
//! aggregate the answers with a further model call
//!
//! Every input is rendered into the worker template's `{input}` and sent as
//! its own task on a `JoinSet`, so wall-clock latency tracks the slowest call
//! rather than the sum. Results are kept in input order. The aggregation
//! template receives `{task}` and `{results}`.
//!
//! There is no partial-success policy: if any invocation fails, the whole run
//! fails with `AggregationFailed` and the aggregation call is never made.

use std::collections::HashMap;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::placeholders::{INPUT, RESULTS, TASK};
use super::WorkflowError;
use crate::domain::completion::{CompletionClient, CompletionError};
use crate::domain::prompt::PromptTemplate;

/// Separator placed between individual results in `{results}`
pub const DEFAULT_RESULT_SEPARATOR: &str = "\n\n---\n\n";

/// Input of a fan-out/aggregate run
#[derive(Debug, Clone)]
pub struct FanOutRequest {
    template: PromptTemplate,
    aggregation_template: PromptTemplate,
    inputs: Vec<String>,
    task_description: Option<String>,
}

impl FanOutRequest {
    pub fn new(
        template: impl Into<PromptTemplate>,
        aggregation_template: impl Into<PromptTemplate>,
        inputs: Vec<String>,
    ) -> Self {
        Self {
            template: template.into(),
            aggregation_template: aggregation_template.into(),
            inputs,
            task_description: None,
        }
    }

    /// Text bound to `{task}` in the aggregation template.
    /// Defaults to the worker template itself.
    pub fn with_task_description(mut self, description: impl Into<String>) -> Self {
        self.task_description = Some(description.into());
        self
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn task_description(&self) -> &str {
        self.task_description
            .as_deref()
            .unwrap_or_else(|| self.template.content())
    }
}

/// Result of a fan-out/aggregate run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedResult {
    /// One result per input, in input order
    pub individual_results: Vec<String>,
    pub aggregated_output: String,
}

/// Runs fan-out/aggregate requests against a completion client
#[derive(Debug, Clone)]
pub struct ParallelWorkflow {
    client: CompletionClient,
    separator: String,
}

impl ParallelWorkflow {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client,
            separator: DEFAULT_RESULT_SEPARATOR.to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub async fn run(
        &self,
        request: &FanOutRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResult, WorkflowError> {
        if request.inputs.is_empty() {
            return Err(WorkflowError::invalid_input(
                "Fan-out requires at least one input",
            ));
        }

        request.template.check_bindings(&[INPUT])?;
        request.aggregation_template.check_bindings(&[TASK, RESULTS])?;

        let prompts = request
            .inputs
            .iter()
            .map(|input| {
                let bindings = HashMap::from([(INPUT.to_string(), input.clone())]);
                request.template.render(&bindings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(inputs = prompts.len(), "Starting parallel workflow");

        let individual_results = self.fan_out(prompts, cancel).await?;

        let bindings = HashMap::from([
            (TASK.to_string(), request.task_description().to_string()),
            (RESULTS.to_string(), individual_results.join(&self.separator)),
        ]);
        let aggregation_prompt = request.aggregation_template.render(&bindings)?;

        let aggregated_output = match self.client.complete(aggregation_prompt, cancel).await {
            Ok(output) => output,
            Err(CompletionError::Cancelled) => return Err(WorkflowError::Cancelled),
            Err(e) => {
                return Err(WorkflowError::aggregation_failed(format!(
                    "aggregation call failed: {}",
                    e
                )));
            }
        };

        info!(inputs = individual_results.len(), "Parallel workflow completed");

        Ok(AggregatedResult {
            individual_results,
            aggregated_output,
        })
    }

    /// Run every prompt concurrently and return outputs in prompt order.
    ///
    /// The join set owns the spawned calls; on any failure it is shut down,
    /// aborting the calls still in flight before this returns.
    async fn fan_out(
        &self,
        prompts: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, WorkflowError> {
        let count = prompts.len();
        let mut join_set = JoinSet::new();

        for (index, prompt) in prompts.into_iter().enumerate() {
            let client = self.client.clone();
            let cancel = cancel.child_token();

            join_set.spawn(async move { (index, client.complete(prompt, &cancel).await) });
        }

        let mut results: Vec<Option<String>> = vec![None; count];

        while let Some(joined) = join_set.join_next().await {
            let failure = match joined {
                Ok((index, Ok(output))) => {
                    results[index] = Some(output);
                    continue;
                }
                Ok((_, Err(CompletionError::Cancelled))) => WorkflowError::Cancelled,
                Ok((index, Err(e))) => {
                    warn!(input = index, error = %e, "Parallel invocation failed");
                    WorkflowError::aggregation_failed(format!("input {} failed: {}", index, e))
                }
                Err(e) => {
                    WorkflowError::aggregation_failed(format!("parallel task aborted: {}", e))
                }
            };

            join_set.shutdown().await;
            return Err(failure);
        }

        results
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| WorkflowError::internal("Fan-out finished with missing results"))
    }
}
