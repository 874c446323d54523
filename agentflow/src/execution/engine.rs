//! Workflow engine
//!
//! Walks the graph from every input node, invoking agents through an
//! [`AgentRunner`] and recording progress on an [`ExecutionTracker`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::FlowError;
use crate::execution::tracker::ExecutionTracker;
use crate::graph::{adjacency, evaluate_condition, select_branch, Link};
use crate::models::agent::AgentConfig;
use crate::models::execution::WorkflowExecution;
use crate::models::workflow::{NodeKind, Workflow, WorkflowNode};

/// Separator placed between merged parallel branch outputs
pub const PARALLEL_SEPARATOR: &str = "\n\n--- Parallel results ---\n\n";

/// Runs one agent turn
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Invoke `agent` with the composed request text and return its reply
    async fn invoke(&self, agent: &AgentConfig, input: &str) -> Result<String, FlowError>;
}

/// Receives the execution record after every state change
pub trait ExecutionSink: Send + Sync {
    fn publish(&self, execution: &WorkflowExecution);
}

/// Runner that answers with the request it was given, tagged by agent name
pub struct EchoRunner;

#[async_trait]
impl AgentRunner for EchoRunner {
    async fn invoke(&self, agent: &AgentConfig, input: &str) -> Result<String, FlowError> {
        debug!("Echo runner invoked for agent {}", agent.id);
        Ok(format!("[{}] {}", agent.name, input))
    }
}

type VisitFuture<'s> = Pin<Box<dyn Future<Output = Result<String, FlowError>> + Send + 's>>;

/// Executes workflows against an agent runner
#[derive(Clone)]
pub struct Engine {
    runner: Arc<dyn AgentRunner>,
}

impl Engine {
    pub fn new(runner: Arc<dyn AgentRunner>) -> Self {
        Self { runner }
    }

    /// Run `workflow` on `input`, driving `tracker` to a terminal status.
    ///
    /// Returns the final text. Errors only surface tracker misuse; node
    /// failures are recorded on the execution instead.
    pub async fn run(
        &self,
        workflow: &Workflow,
        input: &str,
        tracker: &mut ExecutionTracker,
        sink: &dyn ExecutionSink,
    ) -> Result<String, FlowError> {
        info!("Executing workflow: {} ({})", workflow.name, workflow.id);
        tracker.start()?;
        sink.publish(tracker.execution());

        let starts: Vec<&WorkflowNode> = workflow
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Input)
            .collect();

        if !workflow.nodes.is_empty() && starts.is_empty() {
            warn!("Workflow {} has no input node", workflow.id);
            tracker.fail("workflow has no input node")?;
            sink.publish(tracker.execution());
            return Ok(input.to_string());
        }

        let mut nodes = HashMap::new();
        for node in &workflow.nodes {
            nodes.entry(node.id.as_str()).or_insert(node);
        }

        let mut walk = Walk {
            runner: self.runner.as_ref(),
            nodes,
            graph: adjacency(&workflow.nodes, &workflow.edges),
            outputs: HashMap::new(),
            tracker: &mut *tracker,
            sink,
        };

        let mut output = input.to_string();
        for start in starts {
            output = walk.visit(start.id.clone(), input.to_string()).await?;
        }

        tracker.complete()?;
        sink.publish(tracker.execution());
        info!("Workflow {} finished", workflow.id);
        Ok(output)
    }
}

/// What a single node produced
enum Step {
    /// New current text
    Text(String),
    /// Condition result; current text passes through
    Branch(bool),
}

struct Walk<'a> {
    runner: &'a dyn AgentRunner,
    nodes: HashMap<&'a str, &'a WorkflowNode>,
    graph: HashMap<String, Vec<Link>>,
    outputs: HashMap<String, String>,
    tracker: &'a mut ExecutionTracker,
    sink: &'a dyn ExecutionSink,
}

impl<'a> Walk<'a> {
    fn visit<'s>(&'s mut self, node_id: String, input: String) -> VisitFuture<'s> {
        Box::pin(async move {
            // Each node runs once; later arrivals get its recorded text
            if let Some(output) = self.outputs.get(&node_id) {
                return Ok(output.clone());
            }
            let Some(node) = self.nodes.get(node_id.as_str()).copied() else {
                return Ok(input);
            };

            self.tracker.begin_node(&node_id)?;
            self.sink.publish(self.tracker.execution());

            let (text, branch) = match self.step(node, &input).await {
                Ok(Step::Text(output)) => {
                    self.tracker.succeed_node(&node_id, output.clone())?;
                    (output, None)
                }
                Ok(Step::Branch(result)) => {
                    self.tracker.succeed_node(&node_id, result.to_string())?;
                    (input, Some(result))
                }
                Err(message) => {
                    warn!("Node {} failed: {}", node_id, message);
                    self.tracker.fail_node(&node_id, message)?;
                    (input, None)
                }
            };
            self.sink.publish(self.tracker.execution());
            self.outputs.insert(node_id.clone(), text.clone());

            let links = self.graph.get(&node_id).cloned().unwrap_or_default();
            if links.is_empty() {
                return Ok(text);
            }

            match node.kind {
                NodeKind::Condition => {
                    let result = branch.unwrap_or(true);
                    match select_branch(&links, result) {
                        Some(link) => self.visit(link.target.clone(), text).await,
                        None => Ok(text),
                    }
                }
                NodeKind::Parallel => {
                    debug!("Node {} fans out to {} branches", node_id, links.len());
                    let mut merged = Vec::with_capacity(links.len());
                    for link in links {
                        merged.push(self.visit(link.target, text.clone()).await?);
                    }
                    Ok(merged.join(PARALLEL_SEPARATOR))
                }
                _ => {
                    let mut current = text;
                    for link in links {
                        current = self.visit(link.target, current).await?;
                    }
                    Ok(current)
                }
            }
        })
    }

    async fn step(&self, node: &WorkflowNode, input: &str) -> Result<Step, String> {
        match node.kind {
            NodeKind::Input | NodeKind::Output | NodeKind::Parallel => Ok(Step::Text(input.to_string())),
            NodeKind::Agent => {
                let config = node
                    .data
                    .agent_config
                    .as_ref()
                    .ok_or_else(|| "agent node has no agentConfig".to_string())?;
                debug!("Invoking agent {} for node {}", config.id, node.id);
                self.runner
                    .invoke(config, &config.compose_input(input))
                    .await
                    .map(Step::Text)
                    .map_err(|e| e.to_string())
            }
            NodeKind::Condition => {
                let expression = node
                    .data
                    .condition_config
                    .as_ref()
                    .map(|c| c.expression.as_str())
                    .unwrap_or_default();
                Ok(Step::Branch(evaluate_condition(expression, input)))
            }
        }
    }
}
