//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::FlowError;
use crate::server::handlers::{
    create_workflow_handler, delete_workflow_handler, execute_workflow_handler,
    get_execution_handler, get_workflow_handler, health_handler, list_agents_handler,
    list_skills_handler, list_workflows_handler, update_workflow_handler, version_handler,
};
use crate::server::state::ServerState;
use crate::storage::settings::ServerSettings;

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    let api = Router::new()
        // Workflows
        .route(
            "/workflows",
            get(list_workflows_handler).post(create_workflow_handler),
        )
        .route(
            "/workflows/{id}",
            get(get_workflow_handler)
                .put(update_workflow_handler)
                .delete(delete_workflow_handler),
        )
        .route("/workflows/{id}/execute", post(execute_workflow_handler))
        // Executions
        .route("/executions/{id}", get(get_execution_handler))
        // Catalog
        .route("/agents", get(list_agents_handler))
        .route("/skills", get(list_skills_handler));

    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .nest("/api", api)
        // State and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerSettings,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), FlowError>>, FlowError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| FlowError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| FlowError::ServerError(e.to_string()))
    });

    Ok(handle)
}
