//! In-process workflow backend

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::catalog;
use crate::errors::FlowError;
use crate::execution::{AgentRunner, Engine, ExecutionSink, ExecutionTracker};
use crate::gateway::WorkflowGateway;
use crate::models::agent::AgentConfig;
use crate::models::execution::WorkflowExecution;
use crate::models::workflow::Workflow;
use crate::utils::{generate_uuid, now_iso8601};

/// Execution records kept by default before finished ones are evicted
pub const DEFAULT_EXECUTION_CAPACITY: usize = 1000;

struct ExecutionEntry {
    execution: WorkflowExecution,
    seq: u64,
}

/// Execution records keyed by execution id.
///
/// Holds at most `capacity` records while any of them is finished; the
/// oldest finished record is evicted first. Running executions are never
/// evicted.
pub struct ExecutionMap {
    entries: RwLock<HashMap<String, ExecutionEntry>>,
    next_seq: AtomicU64,
    capacity: usize,
}

impl Default for ExecutionMap {
    fn default() -> Self {
        Self::new(DEFAULT_EXECUTION_CAPACITY)
    }
}

impl ExecutionMap {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &str) -> Option<WorkflowExecution> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).map(|e| e.execution.clone())
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExecutionSink for ExecutionMap {
    fn publish(&self, execution: &WorkflowExecution) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = entries.get_mut(&execution.id) {
            entry.execution = execution.clone();
            return;
        }

        // Evict the oldest finished record if at capacity
        if entries.len() >= self.capacity {
            if let Some(oldest_id) = entries
                .iter()
                .filter(|(_, e)| e.execution.is_finished())
                .min_by_key(|(_, e)| e.seq)
                .map(|(id, _)| id.clone())
            {
                debug!("Evicting execution {}", oldest_id);
                entries.remove(&oldest_id);
            }
        }

        let entry = ExecutionEntry {
            execution: execution.clone(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        entries.insert(execution.id.clone(), entry);
    }
}

/// Gateway keeping workflows and executions in memory
#[derive(Clone)]
pub struct InMemoryGateway {
    workflows: Arc<RwLock<Vec<Workflow>>>,
    executions: Arc<ExecutionMap>,
    engine: Engine,
    skills: Vec<String>,
}

impl InMemoryGateway {
    /// Create an empty gateway running agents through `runner`
    pub fn new(runner: Arc<dyn AgentRunner>) -> Self {
        Self {
            workflows: Arc::new(RwLock::new(Vec::new())),
            executions: Arc::new(ExecutionMap::default()),
            engine: Engine::new(runner),
            skills: catalog::known_skills(),
        }
    }

    /// Keep at most `capacity` execution records once they finish
    pub fn with_execution_capacity(mut self, capacity: usize) -> Self {
        self.executions = Arc::new(ExecutionMap::new(capacity));
        self
    }

    /// Replace the advertised skill list
    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    /// Insert workflows as-is, replacing any with the same id
    pub fn seed(&self, workflows: impl IntoIterator<Item = Workflow>) -> usize {
        let mut stored = self.workflows.write().unwrap_or_else(|e| e.into_inner());
        let mut count = 0;
        for mut workflow in workflows {
            if workflow.id.is_empty() {
                workflow.id = generate_uuid();
            }
            match stored.iter_mut().find(|w| w.id == workflow.id) {
                Some(existing) => *existing = workflow,
                None => stored.push(workflow),
            }
            count += 1;
        }
        count
    }

    pub fn executions(&self) -> &ExecutionMap {
        &self.executions
    }

    fn find(&self, id: &str) -> Result<Workflow, FlowError> {
        let stored = self.workflows.read().unwrap_or_else(|e| e.into_inner());
        stored
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| FlowError::NotFound(format!("workflow {}", id)))
    }
}

#[async_trait]
impl WorkflowGateway for InMemoryGateway {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, FlowError> {
        let stored = self.workflows.read().unwrap_or_else(|e| e.into_inner());
        Ok(stored.clone())
    }

    async fn get_workflow(&self, id: &str) -> Result<Workflow, FlowError> {
        self.find(id)
    }

    async fn create_workflow(&self, mut workflow: Workflow) -> Result<Workflow, FlowError> {
        let mut stored = self.workflows.write().unwrap_or_else(|e| e.into_inner());
        if workflow.id.is_empty() {
            workflow.id = generate_uuid();
        } else if stored.iter().any(|w| w.id == workflow.id) {
            return Err(FlowError::ValidationError(format!(
                "workflow {} already exists",
                workflow.id
            )));
        }

        let now = now_iso8601();
        if workflow.created_at.is_empty() {
            workflow.created_at = now.clone();
        }
        workflow.updated_at = now;

        info!("Created workflow {} ({})", workflow.name, workflow.id);
        stored.push(workflow.clone());
        Ok(workflow)
    }

    async fn update_workflow(&self, id: &str, mut workflow: Workflow) -> Result<Workflow, FlowError> {
        let mut stored = self.workflows.write().unwrap_or_else(|e| e.into_inner());
        let existing = stored
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| FlowError::NotFound(format!("workflow {}", id)))?;

        workflow.id = id.to_string();
        if workflow.created_at.is_empty() {
            workflow.created_at = existing.created_at.clone();
        }
        workflow.updated_at = now_iso8601();
        *existing = workflow.clone();

        info!("Updated workflow {}", id);
        Ok(workflow)
    }

    async fn delete_workflow(&self, id: &str) -> Result<(), FlowError> {
        let mut stored = self.workflows.write().unwrap_or_else(|e| e.into_inner());
        let before = stored.len();
        stored.retain(|w| w.id != id);
        if stored.len() == before {
            return Err(FlowError::NotFound(format!("workflow {}", id)));
        }

        info!("Deleted workflow {}", id);
        Ok(())
    }

    async fn execute_workflow(&self, id: &str, input: &str) -> Result<WorkflowExecution, FlowError> {
        let workflow = self.find(id)?;
        let mut tracker = ExecutionTracker::new(&workflow.id, input);
        let snapshot = tracker.execution().clone();
        self.executions.publish(&snapshot);

        let engine = self.engine.clone();
        let executions = Arc::clone(&self.executions);
        let input = input.to_string();
        tokio::spawn(async move {
            if let Err(e) = engine
                .run(&workflow, &input, &mut tracker, executions.as_ref())
                .await
            {
                error!("Execution {} aborted: {}", tracker.execution().id, e);
                if !tracker.execution().is_finished() && tracker.fail(e.to_string()).is_ok() {
                    executions.publish(tracker.execution());
                }
            }
        });

        Ok(snapshot)
    }

    async fn get_execution(&self, id: &str) -> Result<WorkflowExecution, FlowError> {
        self.executions
            .get(id)
            .ok_or_else(|| FlowError::NotFound(format!("execution {}", id)))
    }

    async fn list_agents(&self) -> Result<Vec<AgentConfig>, FlowError> {
        Ok(catalog::predefined_agents().to_vec())
    }

    async fn list_skills(&self) -> Result<Vec<String>, FlowError> {
        Ok(self.skills.clone())
    }
}
