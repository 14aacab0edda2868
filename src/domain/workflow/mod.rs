//! Workflow domain module
//!
//! Four runners built on the completion client:
//! - `chain` - sequential steps, each fed the previous output, with an
//!   optional failure marker that aborts the chain
//! - `parallel` - fan one template out over many inputs, then aggregate
//! - `orchestrator` - decompose a task into typed subtasks and dispatch them
//! - `evaluator` - bounded generate/evaluate/refine loop
//!
//! `WorkflowEngine` wraps all four behind one shared client. Templates are
//! always passed in; `presets` holds ready-made prompt sets.
//!
//! ## Placeholders
//!
//! Each runner binds a fixed set of names (see [`placeholders`]). A template
//! referencing any other name is rejected before the first model call.

mod chain;
mod engine;
mod error;
mod evaluator;
mod orchestrator;
mod parallel;
pub mod presets;

pub use chain::{ChainAborted, ChainOutcome, ChainResult, ChainStep, ChainWorkflow};
pub use engine::{WorkflowConfig, WorkflowEngine};
pub use error::WorkflowError;
pub use evaluator::{
    EvaluationResponse, EvaluationVerdict, EvaluatorOptimizer, Generation, IterationState,
    RefineOutcome, RefineRequest, RefineStopReason,
};
pub use orchestrator::{
    DecompositionResponse, DispatchMode, OrchestratorResult, OrchestratorTemplates,
    OrchestratorWorkers, SubtaskFailed, SubtaskOutcome, Task,
};
pub use parallel::{AggregatedResult, FanOutRequest, ParallelWorkflow, DEFAULT_RESULT_SEPARATOR};

/// Placeholder names bound by the runners
pub mod placeholders {
    /// Chain step input; fan-out worker input
    pub const INPUT: &str = "input";
    /// Task description (fan-out aggregation, decomposition, refine loop)
    pub const TASK: &str = "task";
    /// Joined fan-out results
    pub const RESULTS: &str = "results";
    /// Previous attempt and feedback in the refine loop
    pub const CONTEXT: &str = "context";
    /// Generated response under evaluation
    pub const RESPONSE: &str = "response";
    pub const ORIGINAL_TASK: &str = "original_task";
    pub const TASK_TYPE: &str = "task_type";
    pub const TASK_DESCRIPTION: &str = "task_description";
}
