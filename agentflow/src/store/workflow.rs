//! Workflow graph store
//!
//! Owns the node and edge collections of the workflow being edited. Every
//! state-changing operation bumps [`WorkflowStore::revision`], so observers
//! can detect nested changes by comparing revisions.

use tracing::debug;

use crate::errors::FlowError;
use crate::models::workflow::{NodePatch, Workflow, WorkflowEdge, WorkflowNode};
use crate::utils::{now_iso8601, now_millis};

/// Name given to workflows that were never loaded from a snapshot
pub const UNTITLED_WORKFLOW: &str = "Untitled workflow";

/// Editable workflow graph
#[derive(Debug, Clone, Default)]
pub struct WorkflowStore {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    current_workflow: Option<Workflow>,
    selected_node_id: Option<String>,
    revision: u64,
}

impl WorkflowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    /// First node with `id`
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Snapshot most recently loaded
    pub fn current_workflow(&self) -> Option<&Workflow> {
        self.current_workflow.as_ref()
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    /// Change counter, bumped on every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Append a node without checking its id
    pub fn add_node(&mut self, node: WorkflowNode) {
        debug!("Adding node {} ({})", node.id, node.kind);
        self.nodes.push(node);
        self.touch();
    }

    /// Append a node, rejecting an id that is already present
    pub fn insert_node(&mut self, node: WorkflowNode) -> Result<(), FlowError> {
        if self.node(&node.id).is_some() {
            return Err(FlowError::DuplicateNode(node.id));
        }
        self.add_node(node);
        Ok(())
    }

    /// Merge `patch` into the node with `id`, keeping its position in the list.
    ///
    /// Returns `false` when no node has that id.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.id == id) else {
            debug!("Update skipped, node {} not found", id);
            return false;
        };

        let updated = patch.apply(&self.nodes[index]);
        self.nodes[index] = updated;
        self.touch();
        debug!("Updated node {}", id);
        true
    }

    /// Remove the node with `id` and every edge touching it
    pub fn remove_node(&mut self, id: &str) {
        let node_count = self.nodes.len();
        let edge_count = self.edges.len();

        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| !e.touches(id));

        let mut changed = node_count != self.nodes.len() || edge_count != self.edges.len();
        if self.selected_node_id.as_deref() == Some(id) {
            self.selected_node_id = None;
            changed = true;
        }

        if changed {
            debug!(
                "Removed node {} ({} edges cascaded)",
                id,
                edge_count - self.edges.len()
            );
            self.touch();
        }
    }

    /// Append an edge unless one already connects the same source and target.
    ///
    /// Returns whether the edge was inserted.
    pub fn add_edge(&mut self, edge: WorkflowEdge) -> bool {
        if self.edges.iter().any(|e| e.same_pair(&edge)) {
            debug!(
                "Ignoring edge {}, {} -> {} already connected",
                edge.id, edge.source, edge.target
            );
            return false;
        }

        debug!("Adding edge {} ({} -> {})", edge.id, edge.source, edge.target);
        self.edges.push(edge);
        self.touch();
        true
    }

    /// Append an edge whose endpoints must both be current nodes
    pub fn connect(&mut self, edge: WorkflowEdge) -> Result<bool, FlowError> {
        for endpoint in [&edge.source, &edge.target] {
            if self.node(endpoint).is_none() {
                return Err(FlowError::ValidationError(format!(
                    "edge {} references unknown node {}",
                    edge.id, endpoint
                )));
            }
        }
        Ok(self.add_edge(edge))
    }

    /// Remove the edge with `id`
    pub fn remove_edge(&mut self, id: &str) {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        if self.edges.len() != before {
            debug!("Removed edge {}", id);
            self.touch();
        }
    }

    /// Point the selection at `id`; the id is not checked against the node set
    pub fn select_node(&mut self, id: Option<&str>) {
        let id = id.map(str::to_string);
        if self.selected_node_id != id {
            self.selected_node_id = id;
            self.touch();
        }
    }

    /// The selected node, if the selection points at an existing node
    pub fn selected_node(&self) -> Option<&WorkflowNode> {
        self.selected_node_id.as_deref().and_then(|id| self.node(id))
    }

    /// Drop all nodes, edges and the selection; the loaded snapshot is kept
    pub fn clear_workflow(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.selected_node_id = None;
        self.touch();
    }

    /// Replace the graph with the contents of `workflow`
    pub fn load_workflow(&mut self, workflow: Workflow) {
        debug!(
            "Loading workflow {} ({} nodes, {} edges)",
            workflow.id,
            workflow.nodes.len(),
            workflow.edges.len()
        );
        self.nodes = workflow.nodes.clone();
        self.edges = workflow.edges.clone();
        self.current_workflow = Some(workflow);
        self.selected_node_id = None;
        self.touch();
    }

    /// Snapshot the live graph as a workflow.
    ///
    /// Identity fields come from the loaded workflow; each one that is
    /// missing or empty falls back to a fresh default on its own.
    pub fn export_workflow(&self) -> Workflow {
        let now = now_iso8601();
        let current = self.current_workflow.as_ref();
        let id = non_empty(current.map(|w| &w.id))
            .unwrap_or_else(|| format!("workflow_{}", now_millis()));
        let name = non_empty(current.map(|w| &w.name)).unwrap_or_else(|| UNTITLED_WORKFLOW.to_string());
        let description = current.map(|w| w.description.clone()).unwrap_or_default();
        let created_at = non_empty(current.map(|w| &w.created_at)).unwrap_or_else(|| now.clone());

        Workflow {
            id,
            name,
            description,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            created_at,
            updated_at: now,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}
