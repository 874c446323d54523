//! Local API router tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use agentflow::execution::EchoRunner;
use agentflow::gateway::InMemoryGateway;
use agentflow::server::{router, ServerState};

fn app() -> Router {
    let gateway = InMemoryGateway::new(Arc::new(EchoRunner));
    router(Arc::new(ServerState::new(Arc::new(gateway))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body_bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, value)
}

fn workflow_body(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Triage",
        "nodes": [
            {"id": "in", "type": "input", "position": {"x": 0.0, "y": 0.0}, "data": {"label": "Input"}},
            {"id": "out", "type": "output", "position": {"x": 300.0, "y": 0.0}, "data": {"label": "Output"}}
        ],
        "edges": [
            {"id": "e1", "source": "in", "target": "out"}
        ]
    })
}

#[tokio::test]
async fn test_health_and_version() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "agentflow");

    let (status, body) = send(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["git_hash"].is_string());
}

#[tokio::test]
async fn test_workflow_crud() {
    let app = app();

    let (status, created) = send(&app, "POST", "/api/workflows", Some(workflow_body("wf-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "wf-1");
    assert!(created["createdAt"].is_string());

    let (status, list) = send(&app, "GET", "/api/workflows", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let mut changed = workflow_body("ignored");
    changed["name"] = json!("Renamed");
    let (status, updated) = send(&app, "PUT", "/api/workflows/wf-1", Some(changed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], "wf-1");
    assert_eq!(updated["name"], "Renamed");

    let (status, body) = send(&app, "DELETE", "/api/workflows/wf-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("wf-1"));

    let (status, body) = send(&app, "GET", "/api/workflows/wf-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_execute_and_poll() {
    let app = app();
    send(&app, "POST", "/api/workflows", Some(workflow_body("wf-1"))).await;

    let (status, started) = send(
        &app,
        "POST",
        "/api/workflows/wf-1/execute",
        Some(json!({"input": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(started["workflowId"], "wf-1");
    let execution_id = started["id"].as_str().unwrap().to_string();

    let uri = format!("/api/executions/{}", execution_id);
    let mut finished = Value::Null;
    for _ in 0..200 {
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "completed" || body["status"] == "failed" {
            finished = body;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["results"].as_array().unwrap().len(), 2);
    assert_eq!(finished["results"][1]["output"], "hello");
}

#[tokio::test]
async fn test_errors_map_to_status() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/workflows/ghost/execute",
        Some(json!({"input": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, "POST", "/api/workflows", Some(workflow_body("wf-1"))).await;
    let (status, body) = send(&app, "POST", "/api/workflows", Some(workflow_body("wf-1"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(&app, "GET", "/api/executions/none", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agents_and_skills() {
    let app = app();

    let (status, agents) = send(&app, "GET", "/api/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    let agents = agents.as_array().unwrap();
    assert_eq!(agents.len(), 7);
    assert_eq!(agents[0]["id"], "router");
    assert_eq!(agents[0]["maxIters"], 10);

    let (status, skills) = send(&app, "GET", "/api/skills", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!skills.as_array().unwrap().is_empty());
}
