//! Workflow definition files

use tracing::{debug, warn};

use crate::errors::FlowError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::models::workflow::Workflow;

/// Read one workflow definition
pub async fn load_workflow_file(file: &File) -> Result<Workflow, FlowError> {
    debug!("Loading workflow from {}", file.path().display());
    file.read_json().await
}

/// Read every `*.json` workflow in `dir`, skipping files that fail to parse.
///
/// A missing directory yields no workflows.
pub async fn load_workflow_dir(dir: &Dir) -> Result<Vec<Workflow>, FlowError> {
    if !dir.exists().await {
        return Ok(Vec::new());
    }

    let mut workflows = Vec::new();
    for path in dir.list_files("json").await? {
        match load_workflow_file(&File::new(&path)).await {
            Ok(workflow) => workflows.push(workflow),
            Err(e) => warn!("Skipping workflow file {}: {}", path.display(), e),
        }
    }
    Ok(workflows)
}
