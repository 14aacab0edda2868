//! Chain workflow - ordered steps, each fed the previous step's output
//!
//! A step may carry a failure marker. When the model's output for that step
//! contains the marker, the chain stops and reports `ChainOutcome::Aborted`;
//! later steps never run. An abort is a business outcome, not an error.

use std::collections::HashMap;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::placeholders::INPUT;
use super::WorkflowError;
use crate::domain::completion::{CompletionClient, CompletionError};
use crate::domain::prompt::PromptTemplate;

/// One step of a chain
#[derive(Debug, Clone)]
pub struct ChainStep {
    name: Option<String>,
    template: PromptTemplate,
    failure_marker: Option<String>,
}

impl ChainStep {
    pub fn new(template: impl Into<PromptTemplate>) -> Self {
        Self {
            name: None,
            template: template.into(),
            failure_marker: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Stop the chain when this step's output contains `marker`.
    /// An empty marker is ignored.
    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        self.failure_marker = (!marker.is_empty()).then_some(marker);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn failure_marker(&self) -> Option<&str> {
        self.failure_marker.as_deref()
    }

    fn is_aborted_by(&self, output: &str) -> bool {
        self.failure_marker
            .as_deref()
            .is_some_and(|marker| output.contains(marker))
    }
}

/// Chain ran to the end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainResult {
    /// Output of the last step, or the input for an empty chain
    pub output: String,
    /// Output of every step, in order
    pub intermediate_outputs: Vec<String>,
}

/// Chain stopped on a failure marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainAborted {
    /// Index of the step whose output contained the marker
    pub index: usize,
    /// Output of the aborting step
    pub output: String,
    /// Outputs of the steps that ran, the aborting step included
    pub intermediate_outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainOutcome {
    Completed(ChainResult),
    Aborted(ChainAborted),
}

impl ChainOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Output of the last step that ran
    pub fn output(&self) -> &str {
        match self {
            Self::Completed(result) => &result.output,
            Self::Aborted(aborted) => &aborted.output,
        }
    }
}

/// Runs chains against a completion client
#[derive(Debug, Clone)]
pub struct ChainWorkflow {
    client: CompletionClient,
}

impl ChainWorkflow {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Run `steps` in order starting from `input`
    pub async fn run(
        &self,
        steps: &[ChainStep],
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<ChainOutcome, WorkflowError> {
        for step in steps {
            step.template.check_bindings(&[INPUT])?;
        }

        info!(steps = steps.len(), "Starting chain workflow");

        let mut intermediate_outputs: Vec<String> = Vec::with_capacity(steps.len());
        let mut current = input.to_string();

        for (index, step) in steps.iter().enumerate() {
            let bindings = HashMap::from([(INPUT.to_string(), current)]);
            let prompt = step.template.render(&bindings)?;

            debug!(step = index, name = step.name().unwrap_or(""), "Running chain step");

            let output = match self.client.complete(prompt, cancel).await {
                Ok(output) => output,
                Err(CompletionError::Provider(e)) => {
                    return Err(WorkflowError::step_failed(index, e));
                }
                Err(e) => return Err(e.into()),
            };

            intermediate_outputs.push(output.clone());

            if step.is_aborted_by(&output) {
                info!(
                    step = index,
                    name = step.name().unwrap_or(""),
                    "Chain aborted on failure marker"
                );

                return Ok(ChainOutcome::Aborted(ChainAborted {
                    index,
                    output,
                    intermediate_outputs,
                }));
            }

            current = output;
        }

        info!(steps = steps.len(), "Chain workflow completed");

        Ok(ChainOutcome::Completed(ChainResult {
            output: current,
            intermediate_outputs,
        }))
    }
}
