//! Workflow models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::agent::AgentConfig;

/// A workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique workflow ID (empty when the server should assign one)
    #[serde(default)]
    pub id: String,

    /// Workflow name
    pub name: String,

    /// Workflow description
    #[serde(default)]
    pub description: String,

    /// Nodes in the workflow
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,

    /// Edges connecting nodes
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,

    /// Created timestamp (ISO-8601)
    #[serde(default)]
    pub created_at: String,

    /// Updated timestamp (ISO-8601)
    #[serde(default)]
    pub updated_at: String,
}

/// Node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Agent,
    Input,
    Output,
    Condition,
    Parallel,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Agent => "agent",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Condition => "condition",
            NodeKind::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique node ID
    pub id: String,

    /// Node type
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Node position in the UI
    #[serde(default)]
    pub position: Position,

    /// Node configuration data
    pub data: NodeData,
}

/// Node position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node configuration data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Node label
    #[serde(default)]
    pub label: String,

    /// Agent configuration (agent nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_config: Option<AgentConfig>,

    /// Condition configuration (condition nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_config: Option<ConditionConfig>,

    /// Extension fields kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeData {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }
}

/// Condition node configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default)]
    pub expression: String,
}

/// Typed view of a node's kind together with the config that kind requires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeSpec<'a> {
    Agent(&'a AgentConfig),
    Input,
    Output,
    Condition(&'a ConditionConfig),
    Parallel,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Position::default(),
            data,
        }
    }

    /// Set the position
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Typed view of the node, or `None` when its kind lacks the required config
    pub fn spec(&self) -> Option<NodeSpec<'_>> {
        match self.kind {
            NodeKind::Agent => self.data.agent_config.as_ref().map(NodeSpec::Agent),
            NodeKind::Condition => self.data.condition_config.as_ref().map(NodeSpec::Condition),
            NodeKind::Input => Some(NodeSpec::Input),
            NodeKind::Output => Some(NodeSpec::Output),
            NodeKind::Parallel => Some(NodeSpec::Parallel),
        }
    }
}

/// Partial node update; fields left `None` keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Replaces the whole data block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

impl NodePatch {
    pub fn data(data: NodeData) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            position: Some(Position::new(x, y)),
            ..Default::default()
        }
    }

    /// Build a new node from `node` with this patch applied at the top level
    pub fn apply(&self, node: &WorkflowNode) -> WorkflowNode {
        WorkflowNode {
            id: node.id.clone(),
            kind: self.kind.unwrap_or(node.kind),
            position: self.position.unwrap_or(node.position),
            data: self.data.clone().unwrap_or_else(|| node.data.clone()),
        }
    }
}

/// An edge connecting two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    /// Unique edge ID
    pub id: String,

    /// Source node ID
    pub source: String,

    /// Target node ID
    pub target: String,

    /// Source port ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,

    /// Target port ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,

    /// Presentation type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WorkflowEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            edge_type: None,
            animated: None,
            label: None,
        }
    }

    /// Set the source port
    pub fn from_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Whether this edge connects the same ordered pair as `other`
    pub fn same_pair(&self, other: &WorkflowEdge) -> bool {
        self.source == other.source && self.target == other.target
    }

    /// Whether either endpoint is `node_id`
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
