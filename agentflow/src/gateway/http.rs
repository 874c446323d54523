//! HTTP client for the workflow backend

use std::time::Duration;

use async_trait::async_trait;
use openapi_client::models::ExecuteRequest;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::FlowError;
use crate::gateway::WorkflowGateway;
use crate::models::agent::AgentConfig;
use crate::models::execution::WorkflowExecution;
use crate::models::workflow::Workflow;
use crate::storage::settings::BackendSettings;

/// Gateway backed by a remote workflow service
#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FlowError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| FlowError::ConfigError(format!("invalid backend url {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FlowError::ConfigError(format!(
                "unsupported backend url scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &BackendSettings) -> Result<Self, FlowError> {
        Self::new(&settings.base_url, Duration::from_secs(settings.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, FlowError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status("GET", response).await?;
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, FlowError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let response = check_status("POST", response).await?;
        Ok(response.json().await?)
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, FlowError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let response = self.client.put(&url).json(body).send().await?;
        let response = check_status("PUT", response).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), FlowError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        check_status("DELETE", response).await?;
        Ok(())
    }
}

/// Map a non-success response onto the error taxonomy
async fn check_status(method: &str, response: Response) -> Result<Response, FlowError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);
    Err(status_error(status, body))
}

pub(crate) fn status_error(status: StatusCode, body: String) -> FlowError {
    match status {
        StatusCode::NOT_FOUND => FlowError::NotFound(body),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => FlowError::ValidationError(body),
        _ => FlowError::ServerError(format!("{}: {}", status, body)),
    }
}

#[async_trait]
impl WorkflowGateway for HttpGateway {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, FlowError> {
        self.get("/workflows").await
    }

    async fn get_workflow(&self, id: &str) -> Result<Workflow, FlowError> {
        self.get(&format!("/workflows/{}", id)).await
    }

    async fn create_workflow(&self, workflow: Workflow) -> Result<Workflow, FlowError> {
        self.post("/workflows", &workflow).await
    }

    async fn update_workflow(&self, id: &str, workflow: Workflow) -> Result<Workflow, FlowError> {
        self.put(&format!("/workflows/{}", id), &workflow).await
    }

    async fn delete_workflow(&self, id: &str) -> Result<(), FlowError> {
        self.delete(&format!("/workflows/{}", id)).await
    }

    async fn execute_workflow(&self, id: &str, input: &str) -> Result<WorkflowExecution, FlowError> {
        let request = ExecuteRequest {
            input: input.to_string(),
        };
        self.post(&format!("/workflows/{}/execute", id), &request).await
    }

    async fn get_execution(&self, id: &str) -> Result<WorkflowExecution, FlowError> {
        self.get(&format!("/executions/{}", id)).await
    }

    async fn list_agents(&self) -> Result<Vec<AgentConfig>, FlowError> {
        self.get("/agents").await
    }

    async fn list_skills(&self) -> Result<Vec<String>, FlowError> {
        self.get("/skills").await
    }
}
