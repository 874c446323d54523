//! Backend workflow service boundary

pub mod http;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::FlowError;
use crate::models::agent::AgentConfig;
use crate::models::execution::WorkflowExecution;
use crate::models::workflow::Workflow;

pub use http::HttpGateway;
pub use memory::InMemoryGateway;

/// Persistence and execution of workflows
#[async_trait]
pub trait WorkflowGateway: Send + Sync {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, FlowError>;

    async fn get_workflow(&self, id: &str) -> Result<Workflow, FlowError>;

    /// Persist a new workflow; an empty id is assigned by the backend
    async fn create_workflow(&self, workflow: Workflow) -> Result<Workflow, FlowError>;

    async fn update_workflow(&self, id: &str, workflow: Workflow) -> Result<Workflow, FlowError>;

    async fn delete_workflow(&self, id: &str) -> Result<(), FlowError>;

    /// Start an execution and return it without waiting for completion
    async fn execute_workflow(&self, id: &str, input: &str) -> Result<WorkflowExecution, FlowError>;

    /// Current state of an execution
    async fn get_execution(&self, id: &str) -> Result<WorkflowExecution, FlowError>;

    async fn list_agents(&self) -> Result<Vec<AgentConfig>, FlowError>;

    async fn list_skills(&self) -> Result<Vec<String>, FlowError>;
}

/// Poll `execution_id` every `interval` until it finishes.
///
/// Gives up with `FlowError::ServerError` after `attempts` polls.
pub async fn wait_for_execution(
    gateway: &dyn WorkflowGateway,
    execution_id: &str,
    interval: Duration,
    attempts: u32,
) -> Result<WorkflowExecution, FlowError> {
    for _ in 0..attempts {
        let execution = gateway.get_execution(execution_id).await?;
        if execution.is_finished() {
            return Ok(execution);
        }
        tokio::time::sleep(interval).await;
    }
    Err(FlowError::ServerError(format!(
        "execution {} did not finish after {} polls",
        execution_id, attempts
    )))
}
