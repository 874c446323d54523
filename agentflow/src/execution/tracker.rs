//! Execution record builder

use tracing::debug;

use crate::errors::FlowError;
use crate::execution::fsm::advance;
use crate::models::execution::{ExecutionResult, ExecutionStatus, NodeStatus, WorkflowExecution};
use crate::utils::{generate_uuid, now_iso8601};

/// Node id used for engine-level faults
pub const SYSTEM_NODE_ID: &str = "system";

/// Tracks one execution, enforcing the status state machines
#[derive(Debug, Clone)]
pub struct ExecutionTracker {
    execution: WorkflowExecution,
}

impl ExecutionTracker {
    /// Create a pending execution of `workflow_id`
    pub fn new(workflow_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            execution: WorkflowExecution {
                id: generate_uuid(),
                workflow_id: workflow_id.into(),
                status: ExecutionStatus::Pending,
                input: input.into(),
                results: Vec::new(),
                start_time: now_iso8601(),
                end_time: None,
            },
        }
    }

    /// Resume tracking an existing record
    pub fn from_execution(execution: WorkflowExecution) -> Self {
        Self { execution }
    }

    pub fn execution(&self) -> &WorkflowExecution {
        &self.execution
    }

    pub fn into_execution(self) -> WorkflowExecution {
        self.execution
    }

    /// pending -> running
    pub fn start(&mut self) -> Result<(), FlowError> {
        advance(&mut self.execution.status, ExecutionStatus::Running)?;
        debug!("Execution {} running", self.execution.id);
        Ok(())
    }

    /// Record that `node_id` started; each node is visited at most once
    pub fn begin_node(&mut self, node_id: &str) -> Result<(), FlowError> {
        self.ensure_running()?;
        if self.execution.result(node_id).is_some() {
            return Err(FlowError::InvalidTransition(format!(
                "node {} already visited",
                node_id
            )));
        }

        let mut result = ExecutionResult::pending(node_id);
        advance(&mut result.status, NodeStatus::Running)?;
        result.start_time = Some(now_iso8601());
        self.execution.results.push(result);
        Ok(())
    }

    /// running -> success
    pub fn succeed_node(&mut self, node_id: &str, output: impl Into<String>) -> Result<(), FlowError> {
        let result = self.result_mut(node_id)?;
        advance(&mut result.status, NodeStatus::Success)?;
        result.output = Some(output.into());
        result.end_time = Some(now_iso8601());
        Ok(())
    }

    /// pending|running -> error; a node never begun gets a fresh result
    pub fn fail_node(&mut self, node_id: &str, error: impl Into<String>) -> Result<(), FlowError> {
        if self.execution.result(node_id).is_none() {
            self.execution.results.push(ExecutionResult::pending(node_id));
        }
        let result = self.result_mut(node_id)?;
        advance(&mut result.status, NodeStatus::Error)?;
        result.error = Some(error.into());
        result.end_time = Some(now_iso8601());
        Ok(())
    }

    /// running -> completed
    pub fn complete(&mut self) -> Result<(), FlowError> {
        advance(&mut self.execution.status, ExecutionStatus::Completed)?;
        self.execution.end_time = Some(now_iso8601());
        debug!("Execution {} completed", self.execution.id);
        Ok(())
    }

    /// pending|running -> failed, recording `error` against the system node
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), FlowError> {
        advance(&mut self.execution.status, ExecutionStatus::Failed)?;
        let mut result = ExecutionResult::pending(SYSTEM_NODE_ID);
        advance(&mut result.status, NodeStatus::Error)?;
        result.error = Some(error.into());
        self.execution.results.push(result);
        self.execution.end_time = Some(now_iso8601());
        debug!("Execution {} failed", self.execution.id);
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), FlowError> {
        if self.execution.status != ExecutionStatus::Running {
            return Err(FlowError::InvalidTransition(format!(
                "execution {} is {:?}, not running",
                self.execution.id, self.execution.status
            )));
        }
        Ok(())
    }

    fn result_mut(&mut self, node_id: &str) -> Result<&mut ExecutionResult, FlowError> {
        self.execution
            .results
            .iter_mut()
            .rev()
            .find(|r| r.node_id == node_id)
            .ok_or_else(|| FlowError::NotFound(format!("no result for node {}", node_id)))
    }
}
