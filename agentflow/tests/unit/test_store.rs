//! Workflow store unit tests

use agentflow::catalog;
use agentflow::errors::FlowError;
use agentflow::models::workflow::{
    NodeData, NodeKind, NodePatch, Position, Workflow, WorkflowEdge, WorkflowNode,
};
use agentflow::store::workflow::UNTITLED_WORKFLOW;
use agentflow::store::WorkflowStore;

fn node(id: &str, kind: NodeKind) -> WorkflowNode {
    WorkflowNode::new(id, kind, NodeData::labeled(id))
}

fn create_test_workflow() -> Workflow {
    Workflow {
        id: "wf-1".to_string(),
        name: "Support triage".to_string(),
        description: "Routes tickets".to_string(),
        nodes: vec![node("in", NodeKind::Input), node("out", NodeKind::Output)],
        edges: vec![WorkflowEdge::new("e1", "in", "out")],
        created_at: "2025-01-01T00:00:00.000Z".to_string(),
        updated_at: "2025-01-02T00:00:00.000Z".to_string(),
    }
}

#[test]
fn test_remove_node_cascades_edges() {
    let mut store = WorkflowStore::new();
    store.add_node(node("n1", NodeKind::Input));
    store.add_node(node("n2", NodeKind::Agent));
    store.add_edge(WorkflowEdge::new("e1", "n1", "n2"));

    store.remove_node("n1");

    let ids: Vec<&str> = store.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["n2"]);
    assert!(store.edges().is_empty());
}

#[test]
fn test_no_edge_survives_its_endpoint() {
    let mut store = WorkflowStore::new();
    for id in ["a", "b", "c", "d"] {
        store.add_node(node(id, NodeKind::Agent));
    }
    store.add_edge(WorkflowEdge::new("e1", "a", "b"));
    store.add_edge(WorkflowEdge::new("e2", "b", "c"));
    store.add_edge(WorkflowEdge::new("e3", "c", "b"));
    store.add_edge(WorkflowEdge::new("e4", "c", "d"));

    for id in ["b", "d"] {
        store.remove_node(id);
        assert!(store.edges().iter().all(|e| !e.touches(id)));
    }
    assert!(store.edges().is_empty());
}

#[test]
fn test_add_edge_first_writer_wins() {
    let mut store = WorkflowStore::new();
    assert!(store.add_edge(WorkflowEdge::new("e1", "n1", "n2")));
    assert!(!store.add_edge(WorkflowEdge::new("e2", "n1", "n2")));

    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].id, "e1");

    // The reverse direction is a different pair
    assert!(store.add_edge(WorkflowEdge::new("e3", "n2", "n1")));
    assert_eq!(store.edges().len(), 2);
}

#[test]
fn test_update_missing_node_is_noop() {
    let mut store = WorkflowStore::new();
    store.add_node(node("n1", NodeKind::Input));
    let before = store.nodes().to_vec();
    let revision = store.revision();

    assert!(!store.update_node("ghost", NodePatch::data(NodeData::labeled("x"))));
    assert_eq!(store.nodes(), before.as_slice());
    assert_eq!(store.revision(), revision);
}

#[test]
fn test_update_node_merges_top_level() {
    let mut store = WorkflowStore::new();
    store.add_node(node("a", NodeKind::Input));
    store.add_node(node("b", NodeKind::Output).at(5.0, 5.0));

    assert!(store.update_node("b", NodePatch::position(40.0, 80.0)));
    let updated = store.node("b").unwrap();
    assert_eq!(updated.position, Position::new(40.0, 80.0));
    assert_eq!(updated.data.label, "b");
    assert_eq!(updated.kind, NodeKind::Output);

    // Order is preserved
    assert_eq!(store.nodes()[1].id, "b");
}

#[test]
fn test_select_then_remove_clears_selection() {
    let mut store = WorkflowStore::new();
    store.add_node(node("n1", NodeKind::Input));
    store.select_node(Some("n1"));
    assert_eq!(store.selected_node().map(|n| n.id.as_str()), Some("n1"));

    store.remove_node("n1");
    assert!(store.selected_node_id().is_none());
    assert!(store.selected_node().is_none());
}

#[test]
fn test_selection_of_unknown_node_resolves_to_none() {
    let mut store = WorkflowStore::new();
    store.select_node(Some("later"));
    assert_eq!(store.selected_node_id(), Some("later"));
    assert!(store.selected_node().is_none());

    store.add_node(node("later", NodeKind::Output));
    assert!(store.selected_node().is_some());
}

#[test]
fn test_load_then_export_preserves_identity() {
    let workflow = create_test_workflow();
    let mut store = WorkflowStore::new();
    store.select_node(Some("in"));
    store.load_workflow(workflow.clone());

    assert!(store.selected_node_id().is_none());

    let exported = store.export_workflow();
    assert_eq!(exported.id, workflow.id);
    assert_eq!(exported.name, workflow.name);
    assert_eq!(exported.description, workflow.description);
    assert_eq!(exported.created_at, workflow.created_at);
    assert_eq!(exported.nodes, workflow.nodes);
    assert_eq!(exported.edges, workflow.edges);
    assert!(exported.updated_at.ends_with('Z'));
}

#[test]
fn test_export_twice_is_stable() {
    let mut store = WorkflowStore::new();
    store.load_workflow(create_test_workflow());

    let first = store.export_workflow();
    let second = store.export_workflow();
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);
    // ISO-8601 with fixed precision sorts chronologically
    assert!(second.updated_at >= first.updated_at);
}

#[test]
fn test_export_without_loaded_workflow() {
    let mut store = WorkflowStore::new();
    store.add_node(node("in", NodeKind::Input));

    let exported = store.export_workflow();
    assert!(exported.id.starts_with("workflow_"));
    assert!(exported.id["workflow_".len()..].parse::<i64>().is_ok());
    assert_eq!(exported.name, UNTITLED_WORKFLOW);
    assert!(exported.description.is_empty());
    assert_eq!(exported.nodes.len(), 1);
}

#[test]
fn test_export_fills_blank_fields_of_sparse_workflow() {
    let sparse: Workflow = serde_json::from_value(serde_json::json!({ "name": "" })).unwrap();
    let mut store = WorkflowStore::new();
    store.load_workflow(sparse);

    let exported = store.export_workflow();
    assert!(exported.id.starts_with("workflow_"));
    assert!(exported.id["workflow_".len()..].parse::<i64>().is_ok());
    assert_eq!(exported.name, UNTITLED_WORKFLOW);
    assert!(exported.description.is_empty());
    assert!(exported.created_at.ends_with('Z'));
    assert_eq!(exported.created_at, exported.updated_at);
}

#[test]
fn test_export_keeps_present_fields_of_partial_workflow() {
    let partial: Workflow = serde_json::from_value(serde_json::json!({
        "name": "Named only",
        "createdAt": "2025-03-01T00:00:00.000Z"
    }))
    .unwrap();
    let mut store = WorkflowStore::new();
    store.load_workflow(partial);

    let exported = store.export_workflow();
    assert!(exported.id.starts_with("workflow_"));
    assert_eq!(exported.name, "Named only");
    assert_eq!(exported.created_at, "2025-03-01T00:00:00.000Z");
}

#[test]
fn test_clear_keeps_current_workflow() {
    let mut store = WorkflowStore::new();
    store.load_workflow(create_test_workflow());
    store.select_node(Some("in"));

    store.clear_workflow();
    assert!(store.nodes().is_empty());
    assert!(store.edges().is_empty());
    assert!(store.selected_node_id().is_none());
    assert_eq!(store.current_workflow().map(|w| w.id.as_str()), Some("wf-1"));
    assert_eq!(store.export_workflow().id, "wf-1");
}

#[test]
fn test_add_node_accepts_duplicates_insert_rejects() {
    let mut store = WorkflowStore::new();
    store.add_node(node("dup", NodeKind::Input));
    store.add_node(node("dup", NodeKind::Output));
    assert_eq!(store.nodes().len(), 2);
    // First match wins
    assert_eq!(store.node("dup").unwrap().kind, NodeKind::Input);

    let result = store.insert_node(node("dup", NodeKind::Agent));
    assert!(matches!(result, Err(FlowError::DuplicateNode(id)) if id == "dup"));
    assert_eq!(store.nodes().len(), 2);
}

#[test]
fn test_connect_checks_endpoints() {
    let mut store = WorkflowStore::new();
    store.add_node(node("a", NodeKind::Input));

    let result = store.connect(WorkflowEdge::new("e1", "a", "missing"));
    assert!(matches!(result, Err(FlowError::ValidationError(_))));
    assert!(store.edges().is_empty());

    store.add_node(node("b", NodeKind::Output));
    assert!(store.connect(WorkflowEdge::new("e1", "a", "b")).unwrap());
    assert!(!store.connect(WorkflowEdge::new("e2", "a", "b")).unwrap());
}

#[test]
fn test_remove_edge() {
    let mut store = WorkflowStore::new();
    store.add_edge(WorkflowEdge::new("e1", "a", "b"));
    store.add_edge(WorkflowEdge::new("e2", "b", "c"));

    store.remove_edge("e1");
    store.remove_edge("nope");
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].id, "e2");
}

#[test]
fn test_revision_tracks_every_mutation() {
    let mut store = WorkflowStore::new();
    let mut last = store.revision();
    let mut bumped = |store: &WorkflowStore| {
        let changed = store.revision() > last;
        last = store.revision();
        changed
    };

    store.add_node(node("a", NodeKind::Input));
    assert!(bumped(&store));
    store.update_node("a", NodePatch::data(NodeData::labeled("renamed")));
    assert!(bumped(&store));
    store.add_edge(WorkflowEdge::new("e1", "a", "a"));
    assert!(bumped(&store));
    store.select_node(Some("a"));
    assert!(bumped(&store));
    store.remove_node("a");
    assert!(bumped(&store));
    store.remove_node("a");
    assert!(!bumped(&store));
}

#[test]
fn test_catalog_agent_node_in_store() {
    let mut store = WorkflowStore::new();
    let template = &catalog::predefined_agents()[0];
    let agent = catalog::agent_node(&template.id, "agent-1", Position::new(100.0, 50.0)).unwrap();
    store.insert_node(agent).unwrap();

    let stored = store.node("agent-1").unwrap();
    assert_eq!(stored.kind, NodeKind::Agent);
    assert_eq!(stored.data.agent_config.as_ref().unwrap().name, template.name);
}
