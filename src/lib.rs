//! PMP Agent Workflows
//!
//! Agent workflow patterns over a single completion port:
//! - Chain: prompt steps run in order with an optional failure gate
//! - Parallelization: fan one prompt out over many inputs and aggregate
//! - Orchestrator-workers: decompose a task and dispatch typed subtasks
//! - Evaluator-optimizer: bounded generate/evaluate/refine loop
//!
//! All model traffic goes through a `CompletionPort`; the bundled adapter
//! talks to any OpenAI-compatible chat completion endpoint.

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use tracing::info;

use domain::WorkflowEngine;
use infrastructure::llm::create_completion_port;

/// Load configuration, reading a `.env` file first if one exists
pub fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::load()?)
}

/// Create a workflow engine wired to the configured model endpoint
pub fn create_engine(config: &AppConfig) -> anyhow::Result<WorkflowEngine> {
    let port = create_completion_port(&config.llm)?;

    info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        max_concurrency = config.workflow.max_concurrency,
        "Workflow engine created"
    );

    Ok(WorkflowEngine::new(port, config.workflow.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_engine() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.workflow.max_concurrency = 2;

        let engine = create_engine(&config).unwrap();
        assert_eq!(engine.client().available_permits(), 2);
    }

    #[test]
    fn test_create_engine_without_key() {
        let mut config = AppConfig::default();
        config.llm.api_key_env = "PMP_AGENT_WORKFLOWS_UNSET_KEY".to_string();

        assert!(create_engine(&config).is_err());
    }
}
