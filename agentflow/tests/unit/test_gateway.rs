//! In-memory gateway unit tests

use std::sync::Arc;
use std::time::Duration;

use agentflow::catalog;
use agentflow::cli::{list_remote, run_remote};
use agentflow::errors::FlowError;
use agentflow::execution::EchoRunner;
use agentflow::gateway::{wait_for_execution, HttpGateway, InMemoryGateway, WorkflowGateway};
use agentflow::models::execution::{ExecutionStatus, NodeStatus, WorkflowExecution};
use agentflow::models::workflow::{NodeData, NodeKind, Position, Workflow, WorkflowEdge, WorkflowNode};
use agentflow::server::{router, ServerState};
use tokio::net::TcpListener;

fn create_test_workflow(id: &str, name: &str) -> Workflow {
    let agent = catalog::agent_node("router", "router-1", Position::new(200.0, 0.0)).unwrap();
    Workflow {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        nodes: vec![
            WorkflowNode::new("in", NodeKind::Input, NodeData::labeled("Input")),
            agent,
            WorkflowNode::new("out", NodeKind::Output, NodeData::labeled("Output")),
        ],
        edges: vec![
            WorkflowEdge::new("e1", "in", "router-1"),
            WorkflowEdge::new("e2", "router-1", "out"),
        ],
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn gateway() -> InMemoryGateway {
    InMemoryGateway::new(Arc::new(EchoRunner))
}

/// Serve `backend` on an ephemeral port and return a client for its API
async fn http_gateway(backend: InMemoryGateway) -> HttpGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::new(ServerState::new(Arc::new(backend))));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpGateway::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap()
}

async fn wait_for(gateway: &InMemoryGateway, execution_id: &str) -> WorkflowExecution {
    for _ in 0..200 {
        let execution = gateway.get_execution(execution_id).await.unwrap();
        if execution.is_finished() {
            return execution;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("execution {} did not finish", execution_id);
}

#[tokio::test]
async fn test_create_assigns_id_and_timestamps() {
    let gateway = gateway();
    let created = gateway
        .create_workflow(create_test_workflow("", "Fresh"))
        .await
        .unwrap();

    assert!(!created.id.is_empty());
    assert!(!created.created_at.is_empty());
    assert!(!created.updated_at.is_empty());

    let fetched = gateway.get_workflow(&created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_keeps_given_created_at() {
    let gateway = gateway();
    let mut workflow = create_test_workflow("wf-1", "Imported");
    workflow.created_at = "2024-06-01T00:00:00.000Z".to_string();

    let created = gateway.create_workflow(workflow).await.unwrap();
    assert_eq!(created.id, "wf-1");
    assert_eq!(created.created_at, "2024-06-01T00:00:00.000Z");

    let duplicate = gateway.create_workflow(create_test_workflow("wf-1", "Again")).await;
    assert!(matches!(duplicate, Err(FlowError::ValidationError(_))));
}

#[tokio::test]
async fn test_list_keeps_insertion_order() {
    let gateway = gateway();
    for id in ["b", "a", "c"] {
        gateway.create_workflow(create_test_workflow(id, id)).await.unwrap();
    }

    let ids: Vec<String> = gateway
        .list_workflows()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[tokio::test]
async fn test_update_forces_path_id() {
    let gateway = gateway();
    let created = gateway
        .create_workflow(create_test_workflow("wf-1", "Before"))
        .await
        .unwrap();

    let mut changed = create_test_workflow("something-else", "After");
    changed.created_at = String::new();
    let updated = gateway.update_workflow("wf-1", changed).await.unwrap();

    assert_eq!(updated.id, "wf-1");
    assert_eq!(updated.name, "After");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(gateway.list_workflows().await.unwrap().len(), 1);

    let missing = gateway.update_workflow("nope", create_test_workflow("", "x")).await;
    assert!(matches!(missing, Err(FlowError::NotFound(_))));
}

#[tokio::test]
async fn test_delete_workflow() {
    let gateway = gateway();
    gateway.create_workflow(create_test_workflow("wf-1", "Doomed")).await.unwrap();

    gateway.delete_workflow("wf-1").await.unwrap();
    assert!(matches!(
        gateway.get_workflow("wf-1").await,
        Err(FlowError::NotFound(_))
    ));
    assert!(matches!(
        gateway.delete_workflow("wf-1").await,
        Err(FlowError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_execute_runs_to_completion() {
    let gateway = gateway();
    gateway.create_workflow(create_test_workflow("wf-1", "Echo")).await.unwrap();

    let started = gateway.execute_workflow("wf-1", "plan my week").await.unwrap();
    assert_eq!(started.workflow_id, "wf-1");
    assert_eq!(started.input, "plan my week");
    assert!(matches!(
        started.status,
        ExecutionStatus::Pending | ExecutionStatus::Running
    ));

    let finished = wait_for(&gateway, &started.id).await;
    assert_eq!(finished.status, ExecutionStatus::Completed);
    assert_eq!(finished.results.len(), 3);
    assert!(finished.results.iter().all(|r| r.status == NodeStatus::Success));

    let output = finished.result("out").unwrap().output.clone().unwrap();
    assert!(output.contains("plan my week"));

    // Reads are idempotent
    assert_eq!(gateway.get_execution(&started.id).await.unwrap(), finished);
}

#[tokio::test]
async fn test_execute_unknown_workflow() {
    let gateway = gateway();
    assert!(matches!(
        gateway.execute_workflow("ghost", "hi").await,
        Err(FlowError::NotFound(_))
    ));
    assert!(matches!(
        gateway.get_execution("ghost").await,
        Err(FlowError::NotFound(_))
    ));
    assert!(gateway.executions().is_empty());
}

#[tokio::test]
async fn test_seed_replaces_by_id() {
    let gateway = gateway();
    let count = gateway.seed(vec![
        create_test_workflow("wf-1", "First"),
        create_test_workflow("wf-1", "Second"),
        create_test_workflow("", "Anonymous"),
    ]);
    assert_eq!(count, 3);

    let workflows = gateway.list_workflows().await.unwrap();
    assert_eq!(workflows.len(), 2);
    assert_eq!(workflows[0].name, "Second");
    assert!(!workflows[1].id.is_empty());
}

#[tokio::test]
async fn test_catalog_listings() {
    let gateway = gateway().with_skills(vec!["web_search".to_string()]);
    let agents = gateway.list_agents().await.unwrap();
    assert_eq!(agents.len(), catalog::predefined_agents().len());
    assert_eq!(gateway.list_skills().await.unwrap(), vec!["web_search"]);
}

#[tokio::test]
async fn test_execution_capacity_evicts_finished_runs() {
    let gateway = gateway().with_execution_capacity(2);
    gateway.create_workflow(create_test_workflow("wf-1", "Echo")).await.unwrap();

    let mut ids = Vec::new();
    for input in ["one", "two", "three"] {
        let started = gateway.execute_workflow("wf-1", input).await.unwrap();
        wait_for(&gateway, &started.id).await;
        ids.push(started.id);
    }

    assert_eq!(gateway.executions().len(), 2);
    assert!(matches!(
        gateway.get_execution(&ids[0]).await,
        Err(FlowError::NotFound(_))
    ));
    assert_eq!(
        gateway.get_execution(&ids[2]).await.unwrap().status,
        ExecutionStatus::Completed
    );
}

#[tokio::test]
async fn test_http_gateway_against_local_server() {
    let client = http_gateway(gateway()).await;

    let created = client
        .create_workflow(create_test_workflow("wf-1", "Remote echo"))
        .await
        .unwrap();
    assert_eq!(created.id, "wf-1");
    assert!(!created.created_at.is_empty());

    let fetched = client.get_workflow("wf-1").await.unwrap();
    assert_eq!(fetched, created);

    let duplicate = client.create_workflow(create_test_workflow("wf-1", "Again")).await;
    assert!(matches!(duplicate, Err(FlowError::ValidationError(_))));

    let mut renamed = created.clone();
    renamed.name = "Renamed".to_string();
    let updated = client.update_workflow("wf-1", renamed).await.unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.created_at, created.created_at);

    let started = client.execute_workflow("wf-1", "summarize inbox").await.unwrap();
    assert_eq!(started.workflow_id, "wf-1");
    assert_eq!(started.input, "summarize inbox");

    let finished = wait_for_execution(&client, &started.id, Duration::from_millis(10), 500)
        .await
        .unwrap();
    assert_eq!(finished.status, ExecutionStatus::Completed);
    let output = finished.result("out").unwrap().output.clone().unwrap();
    assert!(output.contains("summarize inbox"));

    client.delete_workflow("wf-1").await.unwrap();
    assert!(matches!(
        client.get_workflow("wf-1").await,
        Err(FlowError::NotFound(_))
    ));
    assert!(matches!(
        client.delete_workflow("wf-1").await,
        Err(FlowError::NotFound(_))
    ));
    assert!(matches!(
        client.get_execution("ghost").await,
        Err(FlowError::NotFound(_))
    ));
    assert!(matches!(
        client.execute_workflow("ghost", "hi").await,
        Err(FlowError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_http_gateway_catalog_listings() {
    let client = http_gateway(gateway().with_skills(vec!["web_search".to_string()])).await;

    let ids: Vec<String> = client
        .list_agents()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    let expected: Vec<String> = catalog::predefined_agents().iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, expected);
    assert_eq!(client.list_skills().await.unwrap(), vec!["web_search"]);
}

#[tokio::test]
async fn test_remote_commands_against_local_server() {
    let backend = gateway();
    backend.seed(vec![create_test_workflow("wf-1", "Seeded")]);
    let client = http_gateway(backend).await;

    let listed = list_remote(&client).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Seeded");

    let execution = run_remote(&client, "wf-1", "hello", Duration::from_millis(10), 500)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert!(execution.is_finished());

    let err = run_remote(&client, "ghost", "hello", Duration::from_millis(10), 5)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unable to execute workflow ghost");
    assert!(matches!(
        err.downcast_ref::<FlowError>(),
        Some(FlowError::NotFound(_))
    ));
}
