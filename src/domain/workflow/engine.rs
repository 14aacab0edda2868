//! Workflow engine - single entry point for the four runners
//!
//! The engine owns one `CompletionClient`, so every runner invocation made
//! through it (including concurrent ones) shares the same concurrency limit.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::chain::{ChainOutcome, ChainStep, ChainWorkflow};
use super::evaluator::{EvaluatorOptimizer, RefineOutcome, RefineRequest};
use super::orchestrator::{
    DispatchMode, OrchestratorResult, OrchestratorTemplates, OrchestratorWorkers,
};
use super::parallel::{AggregatedResult, FanOutRequest, ParallelWorkflow, DEFAULT_RESULT_SEPARATOR};
use super::WorkflowError;
use crate::domain::completion::{CompletionClient, CompletionPort};

/// Engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Upper bound on model calls in flight across all runs
    pub max_concurrency: usize,
    pub dispatch_mode: DispatchMode,
    /// Separator between fan-out results in the aggregation prompt
    pub result_separator: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            dispatch_mode: DispatchMode::default(),
            result_separator: DEFAULT_RESULT_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    client: CompletionClient,
    config: WorkflowConfig,
    templates: OrchestratorTemplates,
}

impl WorkflowEngine {
    pub fn new(port: Arc<dyn CompletionPort>, config: WorkflowConfig) -> Self {
        Self {
            client: CompletionClient::new(port, config.max_concurrency),
            config,
            templates: OrchestratorTemplates::default(),
        }
    }

    /// Replace the decomposition and worker prompts
    pub fn with_orchestrator_templates(mut self, templates: OrchestratorTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    pub async fn run_chain(
        &self,
        steps: &[ChainStep],
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<ChainOutcome, WorkflowError> {
        ChainWorkflow::new(self.client.clone())
            .run(steps, input, cancel)
            .await
    }

    pub async fn run_fan_out_aggregate(
        &self,
        request: &FanOutRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResult, WorkflowError> {
        ParallelWorkflow::new(self.client.clone())
            .with_separator(self.config.result_separator.clone())
            .run(request, cancel)
            .await
    }

    pub async fn run_decompose_dispatch(
        &self,
        task_description: &str,
        cancel: &CancellationToken,
    ) -> Result<OrchestratorResult, WorkflowError> {
        OrchestratorWorkers::new(self.client.clone(), self.templates.clone())
            .with_mode(self.config.dispatch_mode)
            .run(task_description, cancel)
            .await
    }

    pub async fn run_refine_loop(
        &self,
        request: &RefineRequest,
        cancel: &CancellationToken,
    ) -> Result<RefineOutcome, WorkflowError> {
        EvaluatorOptimizer::new(self.client.clone())
            .run(request, cancel)
            .await
    }
}
