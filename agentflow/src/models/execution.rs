//! Execution models

use serde::{Deserialize, Serialize};

/// Per-node execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Running,
    Success,
    Error,
}

/// Workflow-level execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Outcome of a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Node ID (`system` for engine-level faults)
    pub node_id: String,

    /// Node status
    pub status: NodeStatus,

    /// Node output text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl ExecutionResult {
    pub fn pending(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeStatus::Pending,
            output: None,
            error: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// A single run of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    /// Execution ID
    pub id: String,

    /// Workflow that was executed
    pub workflow_id: String,

    /// Execution status, set by the engine
    pub status: ExecutionStatus,

    /// Triggering request text
    pub input: String,

    /// Node results in visit order
    #[serde(default)]
    pub results: Vec<ExecutionResult>,

    pub start_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl WorkflowExecution {
    /// Latest result recorded for `node_id`
    pub fn result(&self, node_id: &str) -> Option<&ExecutionResult> {
        self.results.iter().rev().find(|r| r.node_id == node_id)
    }

    /// Whether the engine has finished with this execution
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Completed | ExecutionStatus::Failed
        )
    }
}
