//! Command implementations for the agentflow binary

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use crate::execution::EchoRunner;
use crate::filesys::file::File;
use crate::gateway::{wait_for_execution, HttpGateway, InMemoryGateway, WorkflowGateway};
use crate::models::execution::WorkflowExecution;
use crate::models::workflow::Workflow;
use crate::server::{serve, ServerState};
use crate::storage::layout::StorageLayout;
use crate::storage::settings::{load_settings, Settings};
use crate::storage::workflows::{load_workflow_dir, load_workflow_file};

/// Interval between execution polls for `--run`
pub const RUN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Collect `--key=value` and bare `--flag` arguments; the program name is skipped
pub fn parse_args(args: impl IntoIterator<Item = String>) -> HashMap<String, String> {
    let mut cli_args = HashMap::new();
    for arg in args.into_iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }
    cli_args
}

/// Resolve the storage layout and settings, applying `--port` and `--backend`
pub async fn load_config(cli_args: &HashMap<String, String>) -> Result<(StorageLayout, Settings)> {
    let layout = cli_args
        .get("home")
        .map(StorageLayout::new)
        .unwrap_or_default();

    let settings_file = layout.settings_file();
    let mut settings = load_settings(&settings_file)
        .await
        .with_context(|| format!("Unable to read settings file {}", settings_file.path().display()))?;

    if let Some(port) = cli_args.get("port") {
        settings.server.port = port
            .parse()
            .with_context(|| format!("Invalid port: {}", port))?;
    }
    if let Some(url) = cli_args.get("backend") {
        settings.backend.base_url = url.clone();
    }

    Ok((layout, settings))
}

/// Client for the configured workflow backend
pub fn backend_gateway(settings: &Settings) -> Result<HttpGateway> {
    HttpGateway::from_settings(&settings.backend)
        .with_context(|| format!("Unable to use backend {}", settings.backend.base_url))
}

pub async fn load_workflow(path: &str) -> Result<Workflow> {
    load_workflow_file(&File::new(path))
        .await
        .with_context(|| format!("Unable to read workflow {}", path))
}

/// Workflows stored on the backend
pub async fn list_remote(gateway: &dyn WorkflowGateway) -> Result<Vec<Workflow>> {
    gateway
        .list_workflows()
        .await
        .context("Unable to list workflows from backend")
}

/// Execute `workflow_id` on the backend and wait for it to finish
pub async fn run_remote(
    gateway: &dyn WorkflowGateway,
    workflow_id: &str,
    input: &str,
    poll: Duration,
    attempts: u32,
) -> Result<WorkflowExecution> {
    let started = gateway
        .execute_workflow(workflow_id, input)
        .await
        .with_context(|| format!("Unable to execute workflow {}", workflow_id))?;
    info!("Execution {} started for workflow {}", started.id, workflow_id);

    wait_for_execution(gateway, &started.id, poll, attempts)
        .await
        .with_context(|| format!("Execution {} did not complete", started.id))
}

/// Serve the workflow API from memory until `shutdown` resolves
pub async fn serve_local<F>(layout: &StorageLayout, settings: &Settings, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let gateway = InMemoryGateway::new(Arc::new(EchoRunner))
        .with_skills(settings.skills.clone())
        .with_execution_capacity(settings.server.max_executions);

    match load_workflow_dir(&layout.workflows_dir()).await {
        Ok(workflows) => {
            let count = gateway.seed(workflows);
            info!("Loaded {} workflows from {}", count, layout.workflows_dir().path().display());
        }
        Err(e) => error!("Unable to load workflows: {e}"),
    }

    let state = Arc::new(ServerState::new(Arc::new(gateway)));
    let handle = serve(&settings.server, state, shutdown)
        .await
        .context("Failed to start server")?;

    match handle.await {
        Ok(result) => result.context("Server failed"),
        Err(e) => bail!("Server task panicked: {e}"),
    }
}
