//! Structural checks over a workflow definition

use std::collections::HashSet;
use std::fmt;

use crate::graph::order::execution_order;
use crate::models::workflow::{NodeKind, Workflow};

/// A structural problem in a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    DuplicateNodeId(String),
    DuplicateEdgeId(String),
    /// Two edges join the same ordered pair
    DuplicateConnection { source: String, target: String },
    /// Edge endpoint names no node
    DanglingEdge { edge_id: String, endpoint: String },
    MissingAgentConfig(String),
    MissingConditionConfig(String),
    NoInputNode,
    /// Nodes that never become ready in the topological walk
    Cycle(Vec<String>),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateNodeId(id) => write!(f, "duplicate node id '{}'", id),
            ValidationIssue::DuplicateEdgeId(id) => write!(f, "duplicate edge id '{}'", id),
            ValidationIssue::DuplicateConnection { source, target } => {
                write!(f, "more than one edge from '{}' to '{}'", source, target)
            }
            ValidationIssue::DanglingEdge { edge_id, endpoint } => {
                write!(f, "edge '{}' references unknown node '{}'", edge_id, endpoint)
            }
            ValidationIssue::MissingAgentConfig(id) => {
                write!(f, "agent node '{}' has no agentConfig", id)
            }
            ValidationIssue::MissingConditionConfig(id) => {
                write!(f, "condition node '{}' has no conditionConfig", id)
            }
            ValidationIssue::NoInputNode => write!(f, "workflow has no input node"),
            ValidationIssue::Cycle(ids) => write!(f, "cycle through nodes: {}", ids.join(", ")),
        }
    }
}

/// Collect every structural issue in `workflow`; empty means valid
pub fn validate(workflow: &Workflow) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut node_ids = HashSet::new();
    for node in &workflow.nodes {
        if !node_ids.insert(node.id.as_str()) {
            issues.push(ValidationIssue::DuplicateNodeId(node.id.clone()));
        }
        match node.kind {
            NodeKind::Agent if node.data.agent_config.is_none() => {
                issues.push(ValidationIssue::MissingAgentConfig(node.id.clone()));
            }
            NodeKind::Condition if node.data.condition_config.is_none() => {
                issues.push(ValidationIssue::MissingConditionConfig(node.id.clone()));
            }
            _ => {}
        }
    }

    let mut edge_ids = HashSet::new();
    let mut pairs = HashSet::new();
    for edge in &workflow.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            issues.push(ValidationIssue::DuplicateEdgeId(edge.id.clone()));
        }
        if !pairs.insert((edge.source.as_str(), edge.target.as_str())) {
            issues.push(ValidationIssue::DuplicateConnection {
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                issues.push(ValidationIssue::DanglingEdge {
                    edge_id: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    if !workflow.nodes.is_empty() && !workflow.nodes.iter().any(|n| n.kind == NodeKind::Input) {
        issues.push(ValidationIssue::NoInputNode);
    }

    let ordered: HashSet<String> = execution_order(&workflow.nodes, &workflow.edges)
        .into_iter()
        .collect();
    let mut stuck: Vec<String> = Vec::new();
    for node in &workflow.nodes {
        if !ordered.contains(&node.id) && !stuck.contains(&node.id) {
            stuck.push(node.id.clone());
        }
    }
    if !stuck.is_empty() {
        issues.push(ValidationIssue::Cycle(stuck));
    }

    issues
}
