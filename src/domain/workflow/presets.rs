//! Ready-made prompt sets for the four workflows
//!
//! Runners never embed prompt text; these are opt-in configurations a caller
//! can pass in (or adapt) instead of writing templates from scratch.

use super::chain::ChainStep;
use super::evaluator::RefineRequest;
use super::parallel::FanOutRequest;

/// Marker the requirement analysis step emits when a request cannot be met
pub const INFEASIBLE_MARKER: &str = "FAIL";

pub const REQUIREMENT_ANALYSIS_PROMPT: &str = r#"You are a senior requirements analyst. Analyse the following business requirement:

Requirement: {input}

Cover:
1. Core business goals
2. Main functional modules
3. Technical challenges
4. Risk assessment

If the requirement cannot be implemented, reply with just "FAIL"."#;

pub const ARCHITECTURE_DESIGN_PROMPT: &str = r#"You are a systems architect. Design a system architecture based on this requirement analysis:

Requirement analysis: {input}

Design:
1. Overall system architecture
2. Technology stack
3. Key database design points
4. Interface conventions
5. Deployment architecture

Provide a complete architecture proposal."#;

pub const IMPLEMENTATION_PLAN_PROMPT: &str = r#"You are a project manager. Draw up an implementation plan based on this architecture design:

Architecture design: {input}

Include:
1. Development phases
2. Staffing
3. Milestones
4. Quality assurance
5. Risk mitigation

Provide a detailed implementation plan."#;

pub const DELIVERY_CHECKLIST_PROMPT: &str = r#"You are a delivery manager. Draw up a delivery checklist based on this implementation plan:

Implementation plan: {input}

Include:
1. Definition of done for development
2. Acceptance test criteria
3. Go-live checklist
4. Operations and monitoring requirements
5. User training plan

Present the checklist as a clear table."#;

pub const RISK_ASSESSMENT_PROMPT: &str = r#"You are a risk assessment expert. Analyse the main risks the following department faces during its digital transformation.

Cover:
1. Technical risk
2. People risk
3. Business continuity risk
4. Budget risk
5. Recommendations"#;

pub const RISK_AGGREGATION_PROMPT: &str = r#"You are a data aggregation expert. Merge the following analyses into one consolidated report.

Original analysis task: {task}

Per-department results:
{results}

Provide:
1. Executive summary
2. Common trends and patterns
3. Key differences
4. Overall conclusions and recommendations

Produce a single consolidated report."#;

pub const ORCHESTRATOR_PROMPT: &str = r#"You are a project management expert. Break the following complex task into specialised subtasks that can run in parallel.
Task: {task}
Analyse the task's complexity and the expertise it needs, then split it into 2-4 subtasks that each need a different skill set.
Each subtask should:
1. Belong to a clear specialism (e.g. frontend, backend API, database design, testing)
2. Be executable on its own
3. Have a concrete deliverable

Reply in JSON:
{
    "analysis": "complexity analysis and decomposition strategy",
    "tasks": [
        {
            "type": "Backend API",
            "description": "Design and implement RESTful endpoints, including validation and error handling"
        },
        {
            "type": "Frontend",
            "description": "Build a responsive UI that talks to the backend API"
        },
        {
            "type": "Database design",
            "description": "Design the schema, write SQL scripts and tune indexes"
        }
    ]
}"#;

pub const WORKER_PROMPT: &str = r#"You are a senior {task_type} expert. Complete the following task:
Project background: {original_task}
Specialism: {task_type}
Task: {task_description}

Follow industry best practice and cover:
1. Technology choices and architecture
2. Concrete implementation
3. Risks and how to address them
4. Quality assurance

Provide a professional, detailed solution."#;

pub const CODE_GENERATOR_PROMPT: &str = r#"You are a Java code generation assistant. Write high-quality Java code for the task.
Remember:
- On the first attempt, write a basic but complete implementation
- If you receive feedback, address every point one by one
- Each iteration must clearly improve on the previous version
- Do not try to implement everything at once; improve step by step

You must reply in JSON:
{"thoughts":"how this round improves the code","response":"the improved Java code"}
{context}
Task: {task}"#;

pub const STRICT_EVALUATOR_PROMPT: &str = r#"You are a very strict interviewer. Evaluate the code on these dimensions:
1. Efficiency: analyse every type used down to the lowest level for best performance
2. No repeated resizing that hurts performance
Rules:
- Return PASS only when the code is excellent on every dimension
- If any dimension can be improved, return NEEDS_IMPROVEMENT
- Give specific, detailed suggestions

You must reply in JSON:
{"evaluation":"PASS or NEEDS_IMPROVEMENT or FAIL","feedback":"detailed feedback per dimension"}

Be strict rather than lenient!

Task: {task}

Code:
{response}"#;

/// Requirement → architecture → implementation plan → delivery checklist,
/// stopping after the first step if the requirement is infeasible
pub fn project_delivery_chain() -> Vec<ChainStep> {
    vec![
        ChainStep::new(REQUIREMENT_ANALYSIS_PROMPT)
            .with_name("requirement_analysis")
            .with_failure_marker(INFEASIBLE_MARKER),
        ChainStep::new(ARCHITECTURE_DESIGN_PROMPT).with_name("architecture_design"),
        ChainStep::new(IMPLEMENTATION_PLAN_PROMPT).with_name("implementation_plan"),
        ChainStep::new(DELIVERY_CHECKLIST_PROMPT).with_name("delivery_checklist"),
    ]
}

/// Per-department digital transformation risk assessment
pub fn risk_assessment(departments: Vec<String>) -> FanOutRequest {
    FanOutRequest::new(
        format!("{}\nInput: {{input}}", RISK_ASSESSMENT_PROMPT),
        RISK_AGGREGATION_PROMPT,
        departments,
    )
    .with_task_description(RISK_ASSESSMENT_PROMPT)
}

/// Code generator refined against a strict performance reviewer
pub fn code_refinement(task: impl Into<String>, max_iterations: usize) -> RefineRequest {
    RefineRequest::new(
        task,
        CODE_GENERATOR_PROMPT,
        STRICT_EVALUATOR_PROMPT,
        max_iterations,
    )
}
