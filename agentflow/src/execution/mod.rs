//! Workflow execution: status rules, record tracking and the engine

pub mod engine;
pub mod fsm;
pub mod tracker;

pub use engine::{AgentRunner, EchoRunner, Engine, ExecutionSink, PARALLEL_SEPARATOR};
pub use tracker::{ExecutionTracker, SYSTEM_NODE_ID};
