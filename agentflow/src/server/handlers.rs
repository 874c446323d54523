//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use openapi_client::models::{ErrorResponse, ExecuteRequest};
use openapi_server::models::{HealthResponse, MessageResponse, VersionResponse};
use tracing::warn;

use crate::errors::FlowError;
use crate::models::workflow::Workflow;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// A `FlowError` rendered as an HTTP response
pub struct ApiError(pub FlowError);

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            FlowError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            FlowError::ValidationError(_) | FlowError::DuplicateNode(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }

        (status, Json(ErrorResponse::new(kind, self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "agentflow".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

pub async fn list_workflows_handler(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<Workflow>> {
    Ok(Json(state.gateway.list_workflows().await?))
}

pub async fn get_workflow_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Workflow> {
    Ok(Json(state.gateway.get_workflow(&id).await?))
}

pub async fn create_workflow_handler(
    State(state): State<Arc<ServerState>>,
    Json(workflow): Json<Workflow>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.gateway.create_workflow(workflow).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_workflow_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(workflow): Json<Workflow>,
) -> ApiResult<Workflow> {
    Ok(Json(state.gateway.update_workflow(&id, workflow).await?))
}

pub async fn delete_workflow_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    state.gateway.delete_workflow(&id).await?;
    Ok(Json(MessageResponse {
        message: format!("Workflow {} deleted", id),
    }))
}

/// Start an execution; the response carries the pending record
pub async fn execute_workflow_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let execution = state.gateway.execute_workflow(&id, &request.input).await?;
    Ok((StatusCode::ACCEPTED, Json(execution)))
}

pub async fn get_execution_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.gateway.get_execution(&id).await?))
}

pub async fn list_agents_handler(State(state): State<Arc<ServerState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.gateway.list_agents().await?))
}

pub async fn list_skills_handler(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<String>> {
    Ok(Json(state.gateway.list_skills().await?))
}
