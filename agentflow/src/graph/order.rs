//! Execution order and adjacency

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::workflow::{WorkflowEdge, WorkflowNode};

/// An outgoing connection from a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub handle: Option<String>,
}

/// Topological order of node ids (Kahn's algorithm).
///
/// The queue is seeded in node order. Edges whose endpoints are not nodes are
/// ignored, and nodes on a cycle never become ready, so they are left out.
pub fn execution_order(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Vec<String> {
    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adj: HashMap<&str, Vec<&str>> = nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();

    for edge in edges {
        let (source, target) = (edge.source.as_str(), edge.target.as_str());
        if !in_degree.contains_key(target) {
            continue;
        }
        if let Some(targets) = adj.get_mut(source) {
            targets.push(target);
            *in_degree.entry(target).or_default() += 1;
        }
    }

    let mut seen = HashSet::new();
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id) == Some(&0) && seen.insert(*id))
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for &next in adj.get(id).map(Vec::as_slice).unwrap_or_default() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    order
}

/// Outgoing links per node, in edge order
pub fn adjacency(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> HashMap<String, Vec<Link>> {
    let mut graph: HashMap<String, Vec<Link>> =
        nodes.iter().map(|n| (n.id.clone(), Vec::new())).collect();

    for edge in edges {
        if let Some(links) = graph.get_mut(&edge.source) {
            links.push(Link {
                target: edge.target.clone(),
                handle: edge.source_handle.clone(),
            });
        }
    }

    graph
}
